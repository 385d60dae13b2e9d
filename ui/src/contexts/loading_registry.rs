use loading::LoadingRegistry;
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct LoadingProviderProps {
    /// Registry to publish. When absent the provider creates one that lives
    /// as long as the provider does.
    #[prop_or_default]
    pub registry: Option<LoadingRegistry>,
    pub children: Children,
}

/// Makes a [`LoadingRegistry`] available to every hook below it.
#[function_component]
pub fn LoadingProvider(props: &LoadingProviderProps) -> Html {
    let registry = use_memo(props.registry.clone(), |registry| {
        registry.clone().unwrap_or_default()
    });

    html! {
        <ContextProvider<LoadingRegistry> context={(*registry).clone()}>
            {props.children.clone()}
        </ContextProvider<LoadingRegistry>>
    }
}

#[hook]
pub fn use_loading_registry() -> LoadingRegistry {
    use_context::<LoadingRegistry>()
        .expect("use_loading_registry must be used within a LoadingProvider")
}

/// Number of operations currently in flight anywhere in the app.
#[hook]
pub fn use_loading_count() -> usize {
    let registry = use_loading_registry();
    let count = use_state_eq(|| registry.active_count());

    {
        let count = count.clone();
        use_effect_with(registry, move |registry| {
            let subscription =
                registry.subscribe(move |active| count.set(active));
            move || subscription.unsubscribe()
        });
    }

    *count
}
