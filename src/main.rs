/// Defaults compiled into the binary for builds without a local .env
/// (mobile, packaged desktop).
const BUNDLED_CONFIG: &str = include_str!("../assets/config.env");

#[cfg(not(target_arch = "wasm32"))]
fn load_config() {
    if dotenvy::dotenv().is_ok() {
        return;
    }
    load_bundled_config();
}

#[cfg(target_arch = "wasm32")]
fn load_config() {
    load_bundled_config();
}

fn load_bundled_config() {
    let entries = BUNDLED_CONFIG
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='));
    for (key, value) in entries {
        let key = key.trim();
        // The environment wins over bundled defaults.
        if std::env::var(key).is_err() {
            // SAFETY: runs at startup, before any threads are spawned
            unsafe {
                std::env::set_var(key, value.trim());
            }
        }
    }
}

fn main() {
    load_config();
    tracing_subscriber::fmt::init();
    dioxus::launch(aiion::ui::App);
}
