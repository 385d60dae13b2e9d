use crate::contexts::toast::{Toast, ToastKind, use_toast};
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct ToastItemProps {
    pub toast: Toast,
}

fn palette(kind: ToastKind) -> (&'static str, &'static str) {
    match kind {
        ToastKind::Error => (
            "bg-red-50 dark:bg-red-900 border-red-200 dark:border-red-800 \
             text-red-700 dark:text-red-400",
            "✕",
        ),
        ToastKind::Success => (
            "bg-green-50 dark:bg-green-900 border-green-200 \
             dark:border-green-800 text-green-700 dark:text-green-400",
            "✓",
        ),
        ToastKind::Info => (
            "bg-neutral-50 dark:bg-neutral-800 border-neutral-200 \
             dark:border-neutral-700 text-neutral-700 dark:text-neutral-300",
            "ℹ",
        ),
    }
}

#[function_component]
pub fn ToastItem(props: &ToastItemProps) -> Html {
    let toasts = use_toast();
    let toast = &props.toast;
    let (colors, icon) = palette(toast.kind);

    let on_close = {
        let id = toast.id;
        Callback::from(move |_: MouseEvent| toasts.dismiss(id))
    };

    html! {
        <div class={classes!(
            "relative", "p-4", "rounded-lg", "border", "shadow-lg",
            "transition-all", "duration-300", "ease-out", colors
        )}>
            <div class="flex items-start space-x-3">
                <span class="flex-shrink-0 text-sm font-medium">{icon}</span>
                <p class="flex-1 min-w-0 text-sm font-medium leading-5">
                    {toast.message.clone()}
                </p>
                <button
                    onclick={on_close}
                    class="flex-shrink-0 inline-flex text-neutral-400 hover:text-neutral-600 dark:hover:text-neutral-200 focus:outline-none transition-colors"
                    title="Dismiss"
                >
                    <span class="text-lg leading-none">{"×"}</span>
                </button>
            </div>
        </div>
    }
}
