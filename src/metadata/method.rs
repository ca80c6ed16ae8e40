//! Methods, their modifiers, and their decoded bodies.
//!
//! A [`Method`] owns its body behind a lock so that a simplification pass can rewrite the
//! instructions in place while other holders of the [`MethodRc`] keep observing the same
//! method identity.
//!
//! # Examples
//!
//! ```rust
//! use dotscope_reactor::assembly::InstructionAssembler;
//! use dotscope_reactor::metadata::method::{LocalVariable, MethodBuilder, MethodModifiers};
//! use dotscope_reactor::metadata::token::Token;
//!
//! let mut asm = InstructionAssembler::new();
//! asm.ldnull()?.ret()?;
//!
//! let method = MethodBuilder::new(Token::new(0x0600_0001), "Decrypt")
//!     .flags(MethodModifiers::STATIC)
//!     .local(LocalVariable::new("System.Byte[]"))
//!     .body(asm.finish()?)
//!     .build();
//!
//! assert!(method.is_static());
//! assert!(method.has_body());
//! assert_eq!(method.instructions().len(), 2);
//! # Ok::<(), dotscope_reactor::Error>(())
//! ```

use std::sync::{Arc, RwLock};

use bitflags::bitflags;
use crossbeam_skiplist::SkipMap;

use crate::{
    assembly::Instruction,
    metadata::{token::Token, typedef::TypeDefRc},
};

/// A map that holds the mapping of [`Token`] to parsed [`Method`]
pub type MethodMap = SkipMap<Token, MethodRc>;
/// A reference-counted pointer to a [`Method`]
pub type MethodRc = Arc<Method>;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Method modifiers and properties (`MethodAttributes` without access and vtable layout bits)
    pub struct MethodModifiers: u32 {
        /// Method is exported via unmanaged export
        const UNMANAGED_EXPORT = 0x0008;
        /// Defined on type, else per instance
        const STATIC = 0x0010;
        /// Method cannot be overridden
        const FINAL = 0x0020;
        /// Method is virtual
        const VIRTUAL = 0x0040;
        /// Method hides by name+sig, else just by name
        const HIDE_BY_SIG = 0x0080;
        /// Method can only be overridden if also accessible
        const STRICT = 0x0200;
        /// Method does not provide an implementation
        const ABSTRACT = 0x0400;
        /// Method is special
        const SPECIAL_NAME = 0x0800;
        /// CLI provides 'special' behavior, depending upon the name of the method
        const RTSPECIAL_NAME = 0x1000;
        /// Implementation is forwarded through PInvoke
        const PINVOKE_IMPL = 0x2000;
    }
}

/// A local variable slot of a method body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalVariable {
    /// Fully qualified name of the variable's type, e.g. `System.IO.MemoryStream`
    pub type_name: String,
    /// Is passed by reference
    pub is_byref: bool,
    /// This variable is pinned
    pub is_pinned: bool,
}

impl LocalVariable {
    /// Creates a plain (not by-ref, not pinned) local of the given type.
    pub fn new(type_name: impl Into<String>) -> Self {
        LocalVariable {
            type_name: type_name.into(),
            is_byref: false,
            is_pinned: false,
        }
    }
}

/// The decoded body of a method.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MethodBody {
    /// Instructions in stream order
    pub instructions: Vec<Instruction>,
    /// Local variable signature
    pub locals: Vec<LocalVariable>,
}

/// A method defined in a module.
#[derive(Debug)]
pub struct Method {
    /// Token of the `MethodDef` row
    pub token: Token,
    /// Method name
    pub name: String,
    /// The type that declares this method, `None` for global methods
    pub declaring_type: Option<TypeDefRc>,
    /// Method modifiers
    pub flags: MethodModifiers,
    body: RwLock<Option<MethodBody>>,
}

impl Method {
    /// Creates a method without a body.
    pub fn new(token: Token, name: impl Into<String>, flags: MethodModifiers) -> Self {
        Method {
            token,
            name: name.into(),
            declaring_type: None,
            flags,
            body: RwLock::new(None),
        }
    }

    /// Returns `true` if the method is declared `static`.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.flags.contains(MethodModifiers::STATIC)
    }

    /// Returns `true` if the method has a body with at least one instruction.
    #[must_use]
    pub fn has_body(&self) -> bool {
        read_lock!(self.body)
            .as_ref()
            .is_some_and(|body| !body.instructions.is_empty())
    }

    /// `Namespace.Type::Name`, or just the name for global methods.
    #[must_use]
    pub fn fullname(&self) -> String {
        match &self.declaring_type {
            Some(owner) => format!("{}::{}", owner.fullname(), self.name),
            None => self.name.clone(),
        }
    }

    /// Snapshot of the current instructions; empty without a body.
    #[must_use]
    pub fn instructions(&self) -> Vec<Instruction> {
        self.with_body(|body| body.instructions.clone())
            .unwrap_or_default()
    }

    /// Snapshot of the local variables; empty without a body.
    #[must_use]
    pub fn locals(&self) -> Vec<LocalVariable> {
        self.with_body(|body| body.locals.clone())
            .unwrap_or_default()
    }

    /// Runs `f` against the body under a read lock.
    pub fn with_body<R>(&self, f: impl FnOnce(&MethodBody) -> R) -> Option<R> {
        read_lock!(self.body).as_ref().map(f)
    }

    /// Runs `f` against the body under a write lock. Returns `false` if there is no body.
    pub fn update_body(&self, f: impl FnOnce(&mut MethodBody)) -> bool {
        match write_lock!(self.body).as_mut() {
            Some(body) => {
                f(body);
                true
            }
            None => false,
        }
    }

    /// Replaces (or removes) the body.
    pub fn set_body(&self, body: Option<MethodBody>) {
        *write_lock!(self.body) = body;
    }

    /// Deep copy of this method owned by `declaring_type`, used when a module is reloaded.
    #[must_use]
    pub fn duplicate(&self, declaring_type: Option<TypeDefRc>) -> Method {
        Method {
            token: self.token,
            name: self.name.clone(),
            declaring_type,
            flags: self.flags,
            body: RwLock::new(read_lock!(self.body).clone()),
        }
    }
}

/// Builder for [`Method`] values.
pub struct MethodBuilder {
    method: Method,
    locals: Vec<LocalVariable>,
    instructions: Option<Vec<Instruction>>,
}

impl MethodBuilder {
    /// Starts a new method with no modifiers and no body.
    pub fn new(token: Token, name: impl Into<String>) -> Self {
        MethodBuilder {
            method: Method::new(token, name, MethodModifiers::empty()),
            locals: Vec::new(),
            instructions: None,
        }
    }

    /// Sets the modifiers.
    #[must_use]
    pub fn flags(mut self, flags: MethodModifiers) -> Self {
        self.method.flags = flags;
        self
    }

    /// Sets the declaring type.
    #[must_use]
    pub fn declaring_type(mut self, owner: TypeDefRc) -> Self {
        self.method.declaring_type = Some(owner);
        self
    }

    /// Appends a local variable.
    #[must_use]
    pub fn local(mut self, local: LocalVariable) -> Self {
        self.locals.push(local);
        self
    }

    /// Appends a local variable of each named type.
    #[must_use]
    pub fn locals<I, S>(mut self, type_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.locals
            .extend(type_names.into_iter().map(LocalVariable::new));
        self
    }

    /// Sets the instruction stream. Without this call the method has no body.
    #[must_use]
    pub fn body(mut self, instructions: Vec<Instruction>) -> Self {
        self.instructions = Some(instructions);
        self
    }

    /// Finishes the method.
    #[must_use]
    pub fn build(self) -> MethodRc {
        let MethodBuilder {
            method,
            locals,
            instructions,
        } = self;

        if let Some(instructions) = instructions {
            method.set_body(Some(MethodBody {
                instructions,
                locals,
            }));
        }

        Arc::new(method)
    }
}
