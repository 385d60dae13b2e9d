use crate::contexts::use_loading_count;
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct LoadingOverlayProps {
    /// Text read out by screen readers and shown under the spinner.
    #[prop_or_else(|| AttrValue::from("Loading..."))]
    pub label: AttrValue,
}

/// Full-screen busy indicator, shown while any operation is in flight.
///
/// Call sites never talk to the overlay; they only take registry tokens.
#[function_component]
pub fn LoadingOverlay(props: &LoadingOverlayProps) -> Html {
    let active = use_loading_count();

    if active == 0 {
        return html! {};
    }

    html! {
        <div
            class="fixed inset-0 z-50 flex items-center justify-center bg-white/60 dark:bg-gray-900/60"
            role="progressbar"
            aria-busy="true"
            aria-label={props.label.clone()}
            data-active={active.to_string()}
        >
            <div class="flex flex-col items-center space-y-3">
                <div class="h-10 w-10 rounded-full border-4 border-neutral-300 border-t-neutral-900 dark:border-neutral-700 dark:border-t-white animate-spin"></div>
                <p class="text-sm text-neutral-600 dark:text-neutral-400">
                    {props.label.clone()}
                </p>
            </div>
        </div>
    }
}
