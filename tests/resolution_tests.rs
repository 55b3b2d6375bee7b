//! End-to-end resolution scenarios: implicit synthesis, deferred providers,
//! diagnostics accumulation, and plan contents.


use test_utils::ResolverHarness;
use wiregen::diagnostics::error_codes;
use wiregen::{
    BindingKey, BindingKind, ConstantValue, DiagnosticLevel, InjectorDecl, ModuleDecl,
    ParamMetadata, ResolveError, ResolverOptions, Scoping, TypeMetadata,
};

#[test]
fn test_implicit_binding_synthesized_from_single_constructor() {
    let mut harness = ResolverHarness::new();
    harness.class_requiring("GameLoop", &["Deck"]);
    harness.concrete_class("Deck");

    let injector = InjectorDecl::new("Game").require(BindingKey::of_type("GameLoop"));
    let plan = harness.resolve(&injector).expect("resolution succeeds");

    let game_loop = plan
        .binding("Game", &BindingKey::of_type("GameLoop"))
        .expect("GameLoop planned");
    assert!(game_loop.implicit);
    assert!(matches!(&game_loop.strategy, BindingKind::Class { class } if class == "GameLoop"));

    let deck = plan
        .binding("Game", &BindingKey::of_type("Deck"))
        .expect("Deck planned");
    assert!(deck.implicit);
}

#[test]
fn test_explicit_binding_preferred_over_implicit() {
    let mut harness = ResolverHarness::new();
    harness.concrete_class("Deck");

    let injector = InjectorDecl::new("Game")
        .install(
            ModuleDecl::module("GameModule")
                .bind_class_in(BindingKey::of_type("Deck"), "Deck", Scoping::Singleton)
                .build(),
        )
        .require(BindingKey::of_type("Deck"));
    let plan = harness.resolve(&injector).expect("resolution succeeds");

    let deck = plan.binding("Game", &BindingKey::of_type("Deck")).unwrap();
    assert!(!deck.implicit);
    assert_eq!(deck.scoping, Scoping::Singleton);
}

#[test]
fn test_provider_wrapped_dependency_breaks_cycle() {
    // A requires Provider<B>, B requires A: legal because the provider
    // edge is deferred
    let mut harness = ResolverHarness::new();
    harness.register(
        TypeMetadata::class("A")
            .injectable_constructor(vec![ParamMetadata::required(
                BindingKey::of_type("B").provider_of(),
            )])
            .build(),
    );
    harness.class_requiring("B", &["A"]);

    let injector = InjectorDecl::new("App").require(BindingKey::of_type("A"));
    let plan = harness.resolve(&injector).expect("deferred edge tolerates the cycle");

    let a = plan.binding("App", &BindingKey::of_type("A")).unwrap();
    assert_eq!(a.dependencies.len(), 1);
    assert!(a.dependencies[0].deferred);
    assert_eq!(a.dependencies[0].key, BindingKey::of_type("B"));
}

#[test]
fn test_non_deferred_cycle_is_fatal() {
    let mut harness = ResolverHarness::new();
    harness.class_requiring("A", &["B"]);
    harness.class_requiring("B", &["A"]);

    let injector = InjectorDecl::new("App").require(BindingKey::of_type("A"));
    let result = harness.resolve(&injector);

    assert!(matches!(result, Err(ResolveError::ResolutionFailed(_))));
    let cycles = harness.diagnostics_with_code(error_codes::CIRCULAR_DEPENDENCY);
    assert_eq!(cycles.len(), 1);
    assert!(cycles[0].message.contains("A"));
    assert!(cycles[0].message.contains("B"));
}

#[test]
fn test_unresolved_key_reports_exactly_one_diagnostic() {
    let mut harness = ResolverHarness::new();
    harness.class_requiring("Consumer", &["Ghost"]);
    harness.class_requiring("OtherConsumer", &["Ghost"]);

    let injector = InjectorDecl::new("App")
        .require(BindingKey::of_type("Consumer"))
        .require(BindingKey::of_type("OtherConsumer"));
    let result = harness.resolve(&injector);

    assert!(result.is_err());
    // Ghost is missing once, no matter how many chains request it
    let missing = harness.diagnostics_with_code(error_codes::TYPE_NOT_FOUND);
    assert_eq!(missing.len(), 1);
    assert!(!missing[0].key_path.is_empty());
}

#[test]
fn test_unresolved_diagnostic_carries_request_path() {
    let mut harness = ResolverHarness::new();
    harness.class_requiring("Outer", &["Inner"]);
    harness.class_requiring("Inner", &["Missing"]);

    let injector = InjectorDecl::new("App").require(BindingKey::of_type("Outer"));
    harness.resolve(&injector).unwrap_err();

    let missing = harness.diagnostics_with_code(error_codes::TYPE_NOT_FOUND);
    assert_eq!(missing.len(), 1);
    assert_eq!(
        missing[0].key_path,
        vec![
            BindingKey::of_type("Outer"),
            BindingKey::of_type("Inner"),
            BindingKey::of_type("Missing"),
        ]
    );
}

#[test]
fn test_qualified_key_needs_explicit_binding() {
    let mut harness = ResolverHarness::new();
    harness.concrete_class("Deck");

    let injector = InjectorDecl::new("App").require(BindingKey::named("Deck", "trick"));
    harness.resolve(&injector).unwrap_err();

    assert_eq!(
        harness
            .diagnostics_with_code(error_codes::IMPLICIT_QUALIFIED)
            .len(),
        1
    );
}

#[test]
fn test_interface_without_binding_reports_no_constructor() {
    let mut harness = ResolverHarness::new();
    harness.register(TypeMetadata::interface("CardView").build());

    let injector = InjectorDecl::new("App").require(BindingKey::of_type("CardView"));
    harness.resolve(&injector).unwrap_err();

    assert_eq!(
        harness
            .diagnostics_with_code(error_codes::NO_SUITABLE_CONSTRUCTOR)
            .len(),
        1
    );
}

#[test]
fn test_linked_binding_resolves_implementation_key() {
    let mut harness = ResolverHarness::new();
    harness.register(TypeMetadata::interface("Api").build());
    harness.concrete_class("ApiImpl");

    let injector = InjectorDecl::new("App")
        .install(
            ModuleDecl::module("M")
                .bind_class(BindingKey::of_type("Api"), "ApiImpl")
                .build(),
        )
        .require(BindingKey::of_type("Api"));
    let plan = harness.resolve(&injector).expect("resolution succeeds");

    let api = plan.binding("App", &BindingKey::of_type("Api")).unwrap();
    assert!(matches!(
        &api.strategy,
        BindingKind::Linked { target } if *target == BindingKey::of_type("ApiImpl")
    ));
    // The implementation got its own (implicit) binding
    let api_impl = plan
        .binding("App", &BindingKey::of_type("ApiImpl"))
        .unwrap();
    assert!(api_impl.implicit);
}

#[test]
fn test_provider_method_dependencies() {
    let mut harness = ResolverHarness::new();
    harness.concrete_class("Shoe");

    let injector = InjectorDecl::new("App")
        .install(
            ModuleDecl::module("DeckModule")
                .provides(
                    BindingKey::of_type("Deck"),
                    "provideDeck",
                    vec![ParamMetadata::required(BindingKey::of_type("Shoe"))],
                )
                .build(),
        )
        .require(BindingKey::of_type("Deck"));
    let plan = harness.resolve(&injector).expect("resolution succeeds");

    let deck = plan.binding("App", &BindingKey::of_type("Deck")).unwrap();
    assert!(matches!(
        &deck.strategy,
        BindingKind::ProviderMethod { module, method, .. }
            if module == "DeckModule" && method == "provideDeck"
    ));
    assert_eq!(deck.dependencies.len(), 1);
    assert_eq!(deck.dependencies[0].key, BindingKey::of_type("Shoe"));
}

#[test]
fn test_provider_class_binding_injects_the_provider() {
    let mut harness = ResolverHarness::new();
    harness.class_requiring("DeckProvider", &["Rng"]);
    harness.concrete_class("Rng");

    let injector = InjectorDecl::new("App")
        .install(
            ModuleDecl::module("M")
                .bind_provider(BindingKey::of_type("Deck"), "DeckProvider")
                .build(),
        )
        .require(BindingKey::of_type("Deck"));
    let plan = harness.resolve(&injector).expect("resolution succeeds");

    let deck = plan.binding("App", &BindingKey::of_type("Deck")).unwrap();
    assert_eq!(deck.dependencies.len(), 1);
    assert_eq!(deck.dependencies[0].key, BindingKey::of_type("Rng"));
}

#[test]
fn test_constant_binding_has_no_dependencies() {
    let mut harness = ResolverHarness::new();
    let key = BindingKey::named("int", "hand-size");

    let injector = InjectorDecl::new("App")
        .install(
            ModuleDecl::module("M")
                .bind_constant(key.clone(), ConstantValue::Int(5))
                .build(),
        )
        .require(key.clone());
    let plan = harness.resolve(&injector).expect("resolution succeeds");

    let constant = plan.binding("App", &key).unwrap();
    assert!(constant.dependencies.is_empty());
    assert!(matches!(
        &constant.strategy,
        BindingKind::Constant { value: ConstantValue::Int(5) }
    ));
}

#[test]
fn test_instance_binding_has_no_dependencies() {
    let mut harness = ResolverHarness::new();

    let injector = InjectorDecl::new("App")
        .install(
            ModuleDecl::module("BootModule")
                .bind_instance(BindingKey::of_type("EventBus"), "bootstrapEventBus")
                .build(),
        )
        .require(BindingKey::of_type("EventBus"));
    let plan = harness.resolve(&injector).expect("resolution succeeds");

    let bus = plan.binding("App", &BindingKey::of_type("EventBus")).unwrap();
    assert!(bus.dependencies.is_empty());
    assert!(matches!(
        &bus.strategy,
        BindingKind::Instance { token } if token == "bootstrapEventBus"
    ));
}

#[test]
fn test_assisted_factory_defers_injected_parameters() {
    // Card's rank comes from the factory caller; the deck is injected
    // lazily at call time, so even a cycle through the factory is fine
    let mut harness = ResolverHarness::new();
    harness.register(
        TypeMetadata::class("Card")
            .injectable_constructor(vec![
                ParamMetadata::required(BindingKey::of_type("Deck")),
                ParamMetadata::required(BindingKey::named("int", "rank")),
            ])
            .build(),
    );
    harness.class_requiring("Deck", &["CardFactory"]);

    let injector = InjectorDecl::new("App")
        .install(
            ModuleDecl::module("M")
                .bind_assisted_factory(
                    BindingKey::of_type("CardFactory"),
                    "Card",
                    vec![BindingKey::named("int", "rank")],
                )
                .build(),
        )
        .require(BindingKey::of_type("Deck"));
    let plan = harness.resolve(&injector).expect("factory cycle is deferred");

    let factory = plan
        .binding("App", &BindingKey::of_type("CardFactory"))
        .unwrap();
    assert!(matches!(&factory.strategy, BindingKind::Assisted { .. }));
    assert_eq!(factory.dependencies.len(), 1);
    assert!(factory.dependencies[0].deferred);
}

#[test]
fn test_optional_dependency_degrades_to_absent() {
    let mut harness = ResolverHarness::new();
    harness.register(
        TypeMetadata::class("Widget")
            .public_constructor(vec![])
            .optional_field("theme", BindingKey::of_type("Theme"))
            .build(),
    );
    // Theme is nowhere to be found

    let injector = InjectorDecl::new("App").require(BindingKey::of_type("Widget"));
    let plan = harness.resolve(&injector).expect("optional miss is not an error");

    let widget = plan.binding("App", &BindingKey::of_type("Widget")).unwrap();
    assert!(widget.dependencies.is_empty());

    let warnings = harness.diagnostics_with_code(error_codes::OPTIONAL_UNSATISFIED);
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].level, DiagnosticLevel::Warning);
    assert_eq!(plan.warnings.len(), 1);
}

#[test]
fn test_optional_then_required_still_errors() {
    let mut harness = ResolverHarness::new();
    harness.register(
        TypeMetadata::class("Widget")
            .public_constructor(vec![])
            .optional_field("theme", BindingKey::of_type("Theme"))
            .build(),
    );
    harness.class_requiring("Panel", &["Theme"]);

    let injector = InjectorDecl::new("App")
        .require(BindingKey::of_type("Widget"))
        .require(BindingKey::of_type("Panel"));
    harness.resolve(&injector).unwrap_err();

    let errors: Vec<_> = harness
        .diagnostics()
        .iter()
        .filter(|d| d.level == DiagnosticLevel::Error)
        .collect();
    assert_eq!(errors.len(), 1);
}

#[test]
fn test_member_injection_requirements_are_resolved() {
    let mut harness = ResolverHarness::new();
    harness.register(
        TypeMetadata::class("MainView")
            .public_constructor(vec![])
            .injectable_field("deck", BindingKey::of_type("Deck"))
            .build(),
    );
    harness.concrete_class("Deck");

    let injector = InjectorDecl::new("App").inject_members("MainView");
    let plan = harness.resolve(&injector).expect("resolution succeeds");

    assert!(plan.binding("App", &BindingKey::of_type("Deck")).is_some());
}

#[test]
fn test_implicit_bindings_can_be_disabled() {
    let mut harness =
        ResolverHarness::new().with_options(ResolverOptions {
            allow_implicit: false,
            ..ResolverOptions::default()
        });
    harness.concrete_class("Deck");

    let injector = InjectorDecl::new("App").require(BindingKey::of_type("Deck"));
    harness.resolve(&injector).unwrap_err();

    assert_eq!(
        harness
            .diagnostics_with_code(error_codes::UNRESOLVED_DEPENDENCY)
            .len(),
        1
    );
}

#[test]
fn test_unused_binding_warning() {
    let mut harness = ResolverHarness::new().with_options(ResolverOptions {
        report_unused: true,
        ..ResolverOptions::default()
    });
    harness.concrete_class("Deck");
    harness.concrete_class("Spare");

    let injector = InjectorDecl::new("App")
        .install(
            ModuleDecl::module("M")
                .bind_class(BindingKey::of_type("Deck"), "Deck")
                .bind_class(BindingKey::of_type("Spare"), "Spare")
                .build(),
        )
        .require(BindingKey::of_type("Deck"));
    let plan = harness.resolve(&injector).expect("warnings do not fail the run");

    let unused = harness.diagnostics_with_code(error_codes::UNUSED_BINDING);
    assert_eq!(unused.len(), 1);
    assert!(unused[0].message.contains("Spare"));
    // Unused bindings stay out of the plan tables
    assert!(plan.binding("App", &BindingKey::of_type("Spare")).is_none());
}

#[test]
fn test_duplicate_binding_fails_but_reports_everything() {
    let mut harness = ResolverHarness::new();
    harness.concrete_class("Deck");

    let injector = InjectorDecl::new("App")
        .install(
            ModuleDecl::module("M")
                .bind_class(BindingKey::of_type("Deck"), "Deck")
                .bind_class(BindingKey::of_type("Deck"), "Deck")
                .bind_class(BindingKey::of_type("Missing"), "Ghost")
                .build(),
        )
        .require(BindingKey::of_type("Deck"))
        .require(BindingKey::of_type("Missing"));
    harness.resolve(&injector).unwrap_err();

    // Both the declaration error and the resolution error surface in one run
    assert_eq!(
        harness
            .diagnostics_with_code(error_codes::DUPLICATE_BINDING)
            .len(),
        1
    );
    assert_eq!(
        harness
            .diagnostics_with_code(error_codes::TYPE_NOT_FOUND)
            .len(),
        1
    );
}

#[test]
fn test_resolution_is_idempotent() {
    let build_injector = || {
        InjectorDecl::new("Game")
            .install(
                ModuleDecl::module("GameModule")
                    .bind_class_in(BindingKey::of_type("Deck"), "Deck", Scoping::Eager)
                    .provides(
                        BindingKey::of_type("Table"),
                        "provideTable",
                        vec![ParamMetadata::required(BindingKey::of_type("Deck"))],
                    )
                    .build(),
            )
            .require(BindingKey::of_type("Table"))
            .require(BindingKey::of_type("GameLoop"))
    };

    let mut harness = ResolverHarness::new();
    harness.concrete_class("Deck");
    harness.class_requiring("GameLoop", &["Table"]);

    let first = harness.resolve(&build_injector()).expect("first run");
    let first_diagnostics = harness.diagnostics().to_vec();
    let second = harness.resolve(&build_injector()).expect("second run");
    let second_diagnostics = harness.diagnostics().to_vec();

    assert_eq!(first, second);
    assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
    assert_eq!(first_diagnostics, second_diagnostics);
}

#[test]
fn test_empty_injector_name_is_malformed() {
    let mut harness = ResolverHarness::new();
    let injector = InjectorDecl::new("");
    assert!(matches!(
        harness.resolve(&injector),
        Err(ResolveError::MalformedDeclaration(_))
    ));
}
