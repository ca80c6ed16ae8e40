use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Candidacy checks, resource resolution and the public-key-token scanner never produce an
/// error; their negative outcomes are ordinary `bool`/`Option` values. Everything listed here is
/// fatal for the operation that returned it.
///
/// # Error Categories
///
/// ## Encrypted resource lifecycle
/// - [`Error::RebindFailure`] - Cloning into a freshly loaded module lost a method or resource
/// - [`Error::KeyRecovery`] - The AES key or IV could not be reconstructed during `init`
/// - [`Error::CipherPrecondition`] - `decrypt`/`encrypt` called without the required state
/// - [`Error::ResourceTableInconsistency`] - The tracked resource vanished from its table
///
/// ## Primitives
/// - [`Error::Crypto`] - The block cipher rejected its key, IV or input
/// - [`Error::Malformed`] - Structurally invalid input (labels, identity blobs)
///
/// # Examples
///
/// ```rust
/// use dotscope_reactor::{Error, metadata::module::Module};
/// use dotscope_reactor::deobfuscation::EncryptedResource;
///
/// let module = Module::new("empty.dll", None);
/// let unit = EncryptedResource::new(module);
/// match unit.decrypt() {
///     Err(Error::CipherPrecondition(reason)) => println!("not ready: {reason}"),
///     Err(e) => println!("other error: {e}"),
///     Ok(_) => unreachable!(),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// A member or resource known to the source instance is missing from the target module.
    ///
    /// Raised when an [`crate::deobfuscation::EncryptedResource`] is rebound to a freshly
    /// loaded copy of its module and the decrypter method or the encrypted resource cannot be
    /// found again.
    #[error("Could not rebind encrypted resource - {0}")]
    RebindFailure(String),

    /// The key or IV of a resource decrypter could not be reconstructed.
    ///
    /// The method was accepted as a candidate, but the constant arrays it should contain are
    /// missing or have the wrong length.
    #[error("Could not recover resource decrypter key material - {0}")]
    KeyRecovery(String),

    /// A cipher operation was requested before the unit was fully initialized.
    #[error("Can't {0} resource")]
    CipherPrecondition(&'static str),

    /// The tracked resource is no longer part of the module's resource table.
    #[error("Could not find encrypted resource '{0}'")]
    ResourceTableInconsistency(String),

    /// The block cipher rejected its parameters or input.
    ///
    /// Typical causes are an unsupported key size or ciphertext that does not decrypt to a
    /// correctly padded plaintext.
    #[error("Crypto - {0}")]
    Crypto(String),

    /// The input is structurally invalid.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_macro_records_location() {
        let err = malformed_error!("label '{}' is undefined", "loop");
        match err {
            Error::Malformed { message, file, line } => {
                assert_eq!(message, "label 'loop' is undefined");
                assert!(file.ends_with("error.rs"));
                assert!(line > 0);
            }
            _ => panic!("Expected Malformed variant"),
        }
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            Error::CipherPrecondition("decrypt").to_string(),
            "Can't decrypt resource"
        );
        assert_eq!(
            Error::ResourceTableInconsistency("a.b".to_string()).to_string(),
            "Could not find encrypted resource 'a.b'"
        );
    }
}
