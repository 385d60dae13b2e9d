//! Toast notifications, the user-facing side of operation outcomes.

use std::rc::Rc;
use uuid::Uuid;
use yew::prelude::*;

use crate::config::config;

/// Older toasts are dropped once this many are on screen.
const MAX_VISIBLE_TOASTS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ToastKind {
    Error,
    Success,
    Info,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub id: Uuid,
    pub message: AttrValue,
    pub kind: ToastKind,
    /// Milliseconds until auto-dismiss; `None` stays until closed.
    pub duration: Option<u32>,
}

impl Toast {
    pub fn new(message: impl Into<AttrValue>, kind: ToastKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            message: message.into(),
            kind,
            duration: Some(config().toast_duration_ms),
        }
    }

    pub fn error(message: impl Into<AttrValue>) -> Self {
        Self::new(message, ToastKind::Error)
    }

    pub fn success(message: impl Into<AttrValue>) -> Self {
        Self::new(message, ToastKind::Success)
    }

    pub fn info(message: impl Into<AttrValue>) -> Self {
        Self::new(message, ToastKind::Info)
    }

    pub fn duration(mut self, duration_ms: u32) -> Self {
        self.duration = Some(duration_ms);
        self
    }

    pub fn sticky(mut self) -> Self {
        self.duration = None;
        self
    }
}

/// Visible toasts, oldest first.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ToastStack {
    pub toasts: Vec<Toast>,
}

pub enum ToastAction {
    Push(Toast),
    Dismiss(Uuid),
    Clear,
}

impl Reducible for ToastStack {
    type Action = ToastAction;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        let mut toasts = self.toasts.clone();

        match action {
            ToastAction::Push(toast) => {
                toasts.push(toast);
                let overflow = toasts.len().saturating_sub(MAX_VISIBLE_TOASTS);
                toasts.drain(..overflow);
            }
            ToastAction::Dismiss(id) => {
                let before = toasts.len();
                toasts.retain(|toast| toast.id != id);
                if toasts.len() == before {
                    return self;
                }
            }
            ToastAction::Clear => toasts.clear(),
        }

        Rc::new(ToastStack { toasts })
    }
}

pub type ToastContext = UseReducerHandle<ToastStack>;

#[derive(Properties, PartialEq)]
pub struct ToastProviderProps {
    pub children: Children,
}

#[function_component]
pub fn ToastProvider(props: &ToastProviderProps) -> Html {
    let stack = use_reducer(ToastStack::default);

    html! {
        <ContextProvider<ToastContext> context={stack}>
            {props.children.clone()}
        </ContextProvider<ToastContext>>
    }
}

#[derive(Clone)]
pub struct ToastHandle {
    context: ToastContext,
}

impl ToastHandle {
    pub fn new(context: ToastContext) -> Self {
        Self { context }
    }

    pub fn push(&self, toast: Toast) {
        let id = toast.id;
        let duration = toast.duration;
        self.context.dispatch(ToastAction::Push(toast));

        if let Some(duration_ms) = duration {
            let context = self.context.clone();
            yew::platform::spawn_local(async move {
                gloo_timers::future::TimeoutFuture::new(duration_ms).await;
                context.dispatch(ToastAction::Dismiss(id));
            });
        }
    }

    pub fn error(&self, message: impl Into<AttrValue>) {
        self.push(Toast::error(message));
    }

    pub fn success(&self, message: impl Into<AttrValue>) {
        self.push(Toast::success(message));
    }

    pub fn info(&self, message: impl Into<AttrValue>) {
        self.push(Toast::info(message));
    }

    pub fn dismiss(&self, id: Uuid) {
        self.context.dispatch(ToastAction::Dismiss(id));
    }

    pub fn clear(&self) {
        self.context.dispatch(ToastAction::Clear);
    }
}

/// Failures stay on screen until dismissed.
impl loading::Notifier for ToastHandle {
    fn success(&self, message: &str) {
        self.push(Toast::success(message.to_string()));
    }

    fn failure(&self, message: &str) {
        self.push(Toast::error(message.to_string()).sticky());
    }
}

#[hook]
pub fn use_toast() -> ToastHandle {
    let context = use_context::<ToastContext>()
        .expect("use_toast must be used within a ToastProvider");
    ToastHandle::new(context)
}
