use crate::errors::OracleError;
use crate::model::BindingKey;
use rustc_hash::FxHashMap;

/// Structural shape of a type as reported by the oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeShape {
    /// A concrete, instantiable class
    Class,
    /// An abstract class (has members but cannot be constructed)
    AbstractClass,
    /// An interface
    Interface,
}

/// A constructor parameter or provider-method parameter slot.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamMetadata {
    pub key: BindingKey,
    pub optional: bool,
}

impl ParamMetadata {
    pub fn required(key: BindingKey) -> Self {
        Self {
            key,
            optional: false,
        }
    }

    pub fn optional(key: BindingKey) -> Self {
        Self {
            key,
            optional: true,
        }
    }
}

/// A declared constructor.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstructorMetadata {
    /// Carries the injection annotation
    pub injectable: bool,
    pub public: bool,
    pub params: Vec<ParamMetadata>,
}

/// An injectable field slot.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMetadata {
    pub name: String,
    pub key: BindingKey,
    pub optional: bool,
}

/// An injectable method (setter-style injection point).
#[derive(Debug, Clone, PartialEq)]
pub struct MethodMetadata {
    pub name: String,
    pub optional: bool,
    pub params: Vec<ParamMetadata>,
}

/// Everything the resolver needs to know about one type.
///
/// Member vectors preserve declaration order; the explorer relies on that
/// ordering contract when flattening dependencies.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeMetadata {
    pub name: String,
    pub shape: TypeShape,
    pub superclass: Option<String>,
    pub constructors: Vec<ConstructorMetadata>,
    pub fields: Vec<FieldMetadata>,
    pub methods: Vec<MethodMetadata>,
}

/// Why no usable constructor could be selected for a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstructorProblem {
    /// Interface or abstract class
    NotInstantiable,
    /// No injectable constructor and no single public no-arg constructor
    NoEligibleConstructor,
    /// More than one injection-annotated constructor
    MultipleInjectable,
}

impl TypeMetadata {
    /// Start describing a concrete class.
    pub fn class(name: impl Into<String>) -> TypeMetadataBuilder {
        TypeMetadataBuilder::new(name, TypeShape::Class)
    }

    /// Start describing an abstract class.
    pub fn abstract_class(name: impl Into<String>) -> TypeMetadataBuilder {
        TypeMetadataBuilder::new(name, TypeShape::AbstractClass)
    }

    /// Start describing an interface.
    pub fn interface(name: impl Into<String>) -> TypeMetadataBuilder {
        TypeMetadataBuilder::new(name, TypeShape::Interface)
    }

    /// Select the constructor used for injection.
    ///
    /// Exactly one injection-annotated constructor wins. With no annotated
    /// constructor, a class with a single public constructor (and no
    /// competing one) uses that; zero or multiple eligible constructors
    /// without a selecting annotation is an error the caller turns into a
    /// diagnostic.
    pub fn select_constructor(&self) -> Result<&ConstructorMetadata, ConstructorProblem> {
        if self.shape != TypeShape::Class {
            return Err(ConstructorProblem::NotInstantiable);
        }

        let mut injectable = self.constructors.iter().filter(|c| c.injectable);
        match (injectable.next(), injectable.next()) {
            (Some(ctor), None) => return Ok(ctor),
            (Some(_), Some(_)) => return Err(ConstructorProblem::MultipleInjectable),
            (None, _) => {}
        }

        let mut public = self.constructors.iter().filter(|c| c.public);
        match (public.next(), public.next()) {
            (Some(ctor), None) => Ok(ctor),
            _ => Err(ConstructorProblem::NoEligibleConstructor),
        }
    }
}

/// Builder for [TypeMetadata] descriptors.
///
/// Used by descriptor loaders and tests alike; member registration order is
/// the declaration order the explorer will observe.
pub struct TypeMetadataBuilder {
    meta: TypeMetadata,
}

impl TypeMetadataBuilder {
    fn new(name: impl Into<String>, shape: TypeShape) -> Self {
        Self {
            meta: TypeMetadata {
                name: name.into(),
                shape,
                superclass: None,
                constructors: Vec::new(),
                fields: Vec::new(),
                methods: Vec::new(),
            },
        }
    }

    pub fn extends(mut self, superclass: impl Into<String>) -> Self {
        self.meta.superclass = Some(superclass.into());
        self
    }

    /// An injection-annotated constructor with the given parameter slots.
    pub fn injectable_constructor(mut self, params: Vec<ParamMetadata>) -> Self {
        self.meta.constructors.push(ConstructorMetadata {
            injectable: true,
            public: true,
            params,
        });
        self
    }

    /// A public constructor without an injection annotation.
    pub fn public_constructor(mut self, params: Vec<ParamMetadata>) -> Self {
        self.meta.constructors.push(ConstructorMetadata {
            injectable: false,
            public: true,
            params,
        });
        self
    }

    /// A non-public constructor without an injection annotation.
    pub fn private_constructor(mut self, params: Vec<ParamMetadata>) -> Self {
        self.meta.constructors.push(ConstructorMetadata {
            injectable: false,
            public: false,
            params,
        });
        self
    }

    pub fn injectable_field(mut self, name: impl Into<String>, key: BindingKey) -> Self {
        self.meta.fields.push(FieldMetadata {
            name: name.into(),
            key,
            optional: false,
        });
        self
    }

    pub fn optional_field(mut self, name: impl Into<String>, key: BindingKey) -> Self {
        self.meta.fields.push(FieldMetadata {
            name: name.into(),
            key,
            optional: true,
        });
        self
    }

    pub fn injectable_method(
        mut self,
        name: impl Into<String>,
        params: Vec<ParamMetadata>,
    ) -> Self {
        self.meta.methods.push(MethodMetadata {
            name: name.into(),
            optional: false,
            params,
        });
        self
    }

    pub fn build(self) -> TypeMetadata {
        self.meta
    }
}

/// Metadata oracle abstraction for dependency injection of type information.
///
/// Implementations must report members in a stable, deterministic order;
/// resolution idempotence depends on it.
pub trait TypeOracle: Send + Sync {
    fn lookup(&self, name: &str) -> Result<&TypeMetadata, OracleError>;

    fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_ok()
    }
}

/// In-memory oracle populated from descriptor builders.
///
/// Production loads descriptors produced by static analysis of the compiled
/// sources; tests register descriptors by hand.
#[derive(Clone)]
pub struct StaticTypeOracle {
    types: FxHashMap<String, TypeMetadata>,
}

impl StaticTypeOracle {
    pub fn new() -> Self {
        Self {
            types: FxHashMap::default(),
        }
    }

    pub fn register(&mut self, metadata: TypeMetadata) {
        self.types.insert(metadata.name.clone(), metadata);
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }
}

impl Default for StaticTypeOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeOracle for StaticTypeOracle {
    fn lookup(&self, name: &str) -> Result<&TypeMetadata, OracleError> {
        self.types
            .get(name)
            .ok_or_else(|| OracleError::TypeNotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_not_found() {
        let oracle = StaticTypeOracle::new();
        assert_eq!(
            oracle.lookup("Missing"),
            Err(OracleError::TypeNotFound("Missing".to_string()))
        );
    }

    #[test]
    fn test_select_single_injectable_constructor() {
        let meta = TypeMetadata::class("Foo")
            .public_constructor(vec![])
            .injectable_constructor(vec![ParamMetadata::required(BindingKey::of_type("Bar"))])
            .build();

        let ctor = meta.select_constructor().unwrap();
        assert!(ctor.injectable);
        assert_eq!(ctor.params.len(), 1);
    }

    #[test]
    fn test_select_falls_back_to_single_public_constructor() {
        let meta = TypeMetadata::class("Foo").public_constructor(vec![]).build();
        let ctor = meta.select_constructor().unwrap();
        assert!(ctor.params.is_empty());

        // A single unannotated constructor with parameters also qualifies
        // as long as nothing competes with it
        let with_args = TypeMetadata::class("Bar")
            .public_constructor(vec![ParamMetadata::required(BindingKey::of_type("Dep"))])
            .build();
        assert_eq!(with_args.select_constructor().unwrap().params.len(), 1);
    }

    #[test]
    fn test_select_rejects_multiple_injectable() {
        let meta = TypeMetadata::class("Foo")
            .injectable_constructor(vec![])
            .injectable_constructor(vec![ParamMetadata::required(BindingKey::of_type("Bar"))])
            .build();
        assert_eq!(
            meta.select_constructor(),
            Err(ConstructorProblem::MultipleInjectable)
        );
    }

    #[test]
    fn test_select_rejects_interface_and_abstract() {
        let interface = TypeMetadata::interface("Api").build();
        assert_eq!(
            interface.select_constructor(),
            Err(ConstructorProblem::NotInstantiable)
        );

        let abstract_class = TypeMetadata::abstract_class("Base")
            .public_constructor(vec![])
            .build();
        assert_eq!(
            abstract_class.select_constructor(),
            Err(ConstructorProblem::NotInstantiable)
        );
    }

    #[test]
    fn test_select_rejects_competing_unannotated_constructors() {
        let meta = TypeMetadata::class("Foo")
            .public_constructor(vec![])
            .public_constructor(vec![ParamMetadata::required(BindingKey::of_type("Bar"))])
            .build();
        assert_eq!(
            meta.select_constructor(),
            Err(ConstructorProblem::NoEligibleConstructor)
        );
    }

    #[test]
    fn test_select_rejects_private_no_arg_constructor() {
        let meta = TypeMetadata::class("Foo").private_constructor(vec![]).build();
        assert_eq!(
            meta.select_constructor(),
            Err(ConstructorProblem::NoEligibleConstructor)
        );
    }
}
