use crate::session::Session;
use crate::views::ChatView;
use dioxus::prelude::*;

const AIION_CSS: Asset = asset!("/assets/aiion.css");

#[component]
pub fn App() -> Element {
    let session = use_signal(Session::restore);

    rsx! {
        document::Link { rel: "stylesheet", href: AIION_CSS }
        ChatView { session }
    }
}
