//! # Method Tables
//!
//! The per-interface description a binding generator emits: one [`Method`] per
//! callable, keyed by a numeric id both sides must agree on.
//!
//! ## Philosophy
//!
//! - **Static Tables**: tables are built with `const fn`s and live in `static`s, so a
//!   lookup on the hot path is a slice scan over `'static` data.
//! - **Link-Time Safety**: [`Interface::validate`] and [`validate_compatibility`]
//!   catch malformed or mismatched tables before the first call is made.

/// Interface table errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Two methods share one id.
    DuplicateMethodId { interface: String, id: u32 },
    /// A one-way method declares a return value it could never deliver.
    OneWayReturnsValue { interface: String, method: String },
    /// The other side has no method under this id.
    MethodMissing { interface: String, id: u32 },
    /// Both sides know the id but disagree on its shape.
    Mismatch { method: String, details: String },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateMethodId { interface, id } => {
                write!(f, "interface '{}' declares method id {} twice", interface, id)
            }
            Self::OneWayReturnsValue { interface, method } => {
                write!(f, "one-way method '{}#{}' declares a return value", interface, method)
            }
            Self::MethodMissing { interface, id } => {
                write!(f, "method id {} of '{}' not found on the other side", id, interface)
            }
            Self::Mismatch { method, details } => {
                write!(f, "method '{}' mismatch: {}", method, details)
            }
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;

/// The declared kind of a parameter or return value.
#[derive(Clone, Copy)]
pub enum Kind {
    /// No value. Only meaningful as a return kind.
    Unit,
    /// Plain data, copied through the codec.
    Value,
    /// An RPC interface, passed as a remote reference.
    Object(&'static Interface),
}

impl Kind {
    fn same_as(&self, other: &Kind) -> bool {
        match (self, other) {
            (Kind::Unit, Kind::Unit) | (Kind::Value, Kind::Value) => true,
            (Kind::Object(a), Kind::Object(b)) => a.name == b.name,
            _ => false,
        }
    }
}

// Tables refer to each other (and to themselves), so Debug prints names only.
impl std::fmt::Debug for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Kind::Unit => write!(f, "Unit"),
            Kind::Value => write!(f, "Value"),
            Kind::Object(interface) => write!(f, "Object({})", interface.name),
        }
    }
}

/// One entry of a method table.
#[derive(Debug, Clone, Copy)]
pub struct Method {
    pub id: u32,
    pub name: &'static str,
    pub params: &'static [Kind],
    pub returns: Kind,
    pub one_way: bool,
    /// `false` for methods that exist on the interface but never go over the wire.
    pub supported: bool,
    /// Class names of the user exceptions the method declares.
    pub throws: &'static [&'static str],
}

impl Method {
    pub const fn new(id: u32, name: &'static str) -> Self {
        Self {
            id,
            name,
            params: &[],
            returns: Kind::Unit,
            one_way: false,
            supported: true,
            throws: &[],
        }
    }

    pub const fn params(self, params: &'static [Kind]) -> Self {
        Self { params, ..self }
    }

    pub const fn returns(self, returns: Kind) -> Self {
        Self { returns, ..self }
    }

    pub const fn one_way(self) -> Self {
        Self { one_way: true, ..self }
    }

    pub const fn unsupported(self) -> Self {
        Self { supported: false, ..self }
    }

    pub const fn throws(self, throws: &'static [&'static str]) -> Self {
        Self { throws, ..self }
    }

    /// Whether `class_name` is in the method's throws list.
    pub fn declares(&self, class_name: &str) -> bool {
        self.throws.iter().any(|declared| *declared == class_name)
    }
}

/// A named method table.
#[derive(Debug)]
pub struct Interface {
    pub name: &'static str,
    pub methods: &'static [Method],
}

impl Interface {
    pub const fn new(name: &'static str, methods: &'static [Method]) -> Self {
        Self { name, methods }
    }

    pub fn method(&'static self, id: u32) -> Option<&'static Method> {
        self.methods.iter().find(|method| method.id == id)
    }

    pub fn method_by_name(&'static self, name: &str) -> Option<&'static Method> {
        self.methods.iter().find(|method| method.name == name)
    }

    /// Checks the table for duplicate ids and one-way methods with results.
    pub fn validate(&self) -> Result<()> {
        for (index, method) in self.methods.iter().enumerate() {
            if self.methods[..index].iter().any(|earlier| earlier.id == method.id) {
                return Err(Error::DuplicateMethodId {
                    interface: self.name.to_string(),
                    id: method.id,
                });
            }
            if method.one_way && !matches!(method.returns, Kind::Unit) {
                return Err(Error::OneWayReturnsValue {
                    interface: self.name.to_string(),
                    method: method.name.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Validates that a caller's view of an interface matches the serving side's.
///
/// Checks that every method of `local` exists in `remote` under the same id with the
/// same arity, parameter kinds, return kind and one-way flag.
pub fn validate_compatibility(local: &Interface, remote: &Interface) -> Result<()> {
    for method in local.methods {
        let qualified = format!("{}#{}", local.name, method.name);
        let other = remote
            .methods
            .iter()
            .find(|other| other.id == method.id)
            .ok_or_else(|| Error::MethodMissing {
                interface: remote.name.to_string(),
                id: method.id,
            })?;

        if method.params.len() != other.params.len() {
            return Err(Error::Mismatch {
                method: qualified,
                details: format!(
                    "parameter count mismatch: local expects {}, remote provides {}",
                    method.params.len(),
                    other.params.len()
                ),
            });
        }

        let params_agree = method
            .params
            .iter()
            .zip(other.params)
            .all(|(a, b)| a.same_as(b));
        if !params_agree {
            return Err(Error::Mismatch {
                method: qualified,
                details: format!(
                    "parameter kinds differ: {:?} vs {:?}",
                    method.params, other.params
                ),
            });
        }

        if !method.returns.same_as(&other.returns) {
            return Err(Error::Mismatch {
                method: qualified,
                details: format!(
                    "return kind differs: {:?} vs {:?}",
                    method.returns, other.returns
                ),
            });
        }

        if method.one_way != other.one_way {
            return Err(Error::Mismatch {
                method: qualified,
                details: "one-way flag differs".to_string(),
            });
        }
    }

    Ok(())
}
