use loading::LoadingRegistry;
use payloads::APIClient;
use yew::prelude::*;

pub mod components;
pub mod config;
pub mod contexts;
pub mod hooks;
mod logs;

use components::{LoadingOverlay, ToastContainer};
use config::config;
use contexts::{LoadingProvider, ToastProvider};

// Global API client - configurable at build time or same-origin fallback
pub fn get_api_client() -> APIClient {
    let address = config()
        .backend_url
        .map(str::to_string)
        .unwrap_or_else(page_origin);

    APIClient::new(address)
}

fn page_origin() -> String {
    web_sys::window()
        .and_then(|window| window.location().origin().ok())
        .unwrap_or_default()
}

#[derive(Properties, PartialEq)]
pub struct AppShellProps {
    /// Registry shared by every operation below; one is created when absent.
    #[prop_or_default]
    pub registry: Option<LoadingRegistry>,
    #[prop_or_default]
    pub children: Children,
}

/// Providers and global chrome that every page renders inside.
#[function_component]
pub fn AppShell(props: &AppShellProps) -> Html {
    html! {
        <LoadingProvider registry={props.registry.clone()}>
            <ToastProvider>
                <LoadingOverlay />
                <ToastContainer />
                {props.children.clone()}
            </ToastProvider>
        </LoadingProvider>
    }
}

/// Entry point: install logging once, then mount [`App`] on the body.
pub fn start() {
    logs::init_logging(config().log_filter);
    yew::Renderer::<App>::new().render();
}

#[function_component]
pub fn App() -> Html {
    html! {
        <AppShell>
            <div class="min-h-screen bg-white dark:bg-gray-900 text-gray-900 dark:text-gray-100 transition-colors">
                <main class="max-w-7xl mx-auto px-4 sm:px-6 lg:px-8 py-8" />
            </div>
        </AppShell>
    }
}
