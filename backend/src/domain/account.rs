//! Account data model.
//!
//! Accounts are addressed by email, but the store keys them by a short
//! opaque [`Identifier`]. The identifier is derived from the email (see
//! [`crate::domain::IdentifierPolicy`]), or is a placeholder for accounts
//! without an email, or is a legacy username left over from a store that has
//! not been migrated yet.

use std::fmt;

use email_identifier::{DEFAULT_WIDTH, EmailIdentifier};
use zeroize::Zeroizing;

/// Maximum width of the stored identifier column.
pub const IDENTIFIER_MAX_LEN: usize = DEFAULT_WIDTH;

/// Validation errors returned by [`Identifier::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountValidationError {
    EmptyIdentifier,
    IdentifierTooLong { max: usize },
}

impl fmt::Display for AccountValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyIdentifier => write!(f, "account identifier must not be empty"),
            Self::IdentifierTooLong { max } => {
                write!(f, "account identifier must be at most {max} characters")
            }
        }
    }
}

impl std::error::Error for AccountValidationError {}

/// Storage-assigned primary key of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountId(i64);

impl AccountId {
    /// Wrap a key assigned by the store.
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Raw key value.
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique key stored in the account table.
///
/// ## Invariants
/// - non-empty;
/// - at most [`IDENTIFIER_MAX_LEN`] characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(String);

impl Identifier {
    /// Validate and construct an [`Identifier`].
    ///
    /// # Examples
    /// ```
    /// use emailusernames::domain::Identifier;
    ///
    /// let identifier = Identifier::new("example_user").expect("valid identifier");
    /// assert_eq!(identifier.as_str(), "example_user");
    /// assert!(Identifier::new("").is_err());
    /// ```
    pub fn new(value: impl Into<String>) -> Result<Self, AccountValidationError> {
        let value = value.into();
        if value.is_empty() {
            return Err(AccountValidationError::EmptyIdentifier);
        }
        if value.chars().count() > IDENTIFIER_MAX_LEN {
            return Err(AccountValidationError::IdentifierTooLong {
                max: IDENTIFIER_MAX_LEN,
            });
        }
        Ok(Self(value))
    }

    /// Wrap a value whose width the caller has already bounded.
    pub(crate) fn from_bounded(value: String) -> Self {
        debug_assert!(!value.is_empty() && value.chars().count() <= IDENTIFIER_MAX_LEN);
        Self(value)
    }

    /// Borrow the identifier text.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<EmailIdentifier> for Identifier {
    fn from(value: EmailIdentifier) -> Self {
        // The default codec width equals the column width.
        Self(value.into_inner())
    }
}

impl From<Identifier> for String {
    fn from(value: Identifier) -> Self {
        value.0
    }
}

/// Email address as entered, case preserved.
///
/// An empty email is representable; whether it is acceptable is decided by
/// the empty-email policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Email(String);

impl Email {
    /// Wrap an email address.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The empty email.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether no address is set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the address as entered.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Lower-cased form used for case-insensitive comparisons.
    pub fn normalized(&self) -> String {
        self.0.to_lowercase()
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Email {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Plain-text password handed to the store, wiped from memory on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(Zeroizing<String>);

impl Password {
    /// Wrap a password.
    pub fn new(value: impl Into<String>) -> Self {
        Self(Zeroizing::new(value.into()))
    }

    /// Borrow the password text.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

/// Policy flags carried by an account. Not interpreted by this crate beyond
/// rejecting inactive accounts during authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountFlags {
    pub active: bool,
    pub staff: bool,
    pub superuser: bool,
}

impl AccountFlags {
    /// Flags for a privileged account.
    pub const fn superuser() -> Self {
        Self {
            active: true,
            staff: true,
            superuser: true,
        }
    }
}

impl Default for AccountFlags {
    fn default() -> Self {
        Self {
            active: true,
            staff: false,
            superuser: false,
        }
    }
}

/// Persisted account.
///
/// ## Invariants
/// - `identifier` is unique across the store after every successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    id: AccountId,
    identifier: Identifier,
    email: Email,
    flags: AccountFlags,
}

impl Account {
    /// Assemble an account loaded from storage.
    pub fn new(id: AccountId, identifier: Identifier, email: Email, flags: AccountFlags) -> Self {
        Self {
            id,
            identifier,
            email,
            flags,
        }
    }

    /// Storage key.
    pub fn id(&self) -> AccountId {
        self.id
    }

    /// Stored unique identifier.
    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    /// Email address, possibly empty.
    pub fn email(&self) -> &Email {
        &self.email
    }

    /// Policy flags.
    pub fn flags(&self) -> AccountFlags {
        self.flags
    }

    /// Whether the account may authenticate.
    pub fn is_active(&self) -> bool {
        self.flags.active
    }

    /// Whether the account may use the admin surface.
    pub fn is_staff(&self) -> bool {
        self.flags.staff
    }

    /// Whether the account holds every permission.
    pub fn is_superuser(&self) -> bool {
        self.flags.superuser
    }

    /// Label shown to operators: the email, or the identifier when there is
    /// no email.
    ///
    /// # Examples
    /// ```
    /// use emailusernames::domain::{Account, AccountFlags, AccountId, Email, Identifier};
    ///
    /// let identifier = Identifier::new("-7").expect("valid identifier");
    /// let account = Account::new(AccountId::new(7), identifier, Email::empty(), AccountFlags::default());
    /// assert_eq!(account.display_label(), "None (-7)");
    /// ```
    pub fn display_label(&self) -> String {
        if self.email.is_empty() {
            format!("None ({})", self.identifier)
        } else {
            self.email.to_string()
        }
    }

    /// Replace the email. The identifier is recomputed on the next save.
    pub fn set_email(&mut self, email: Email) {
        self.email = email;
    }

    /// Set the active flag.
    pub fn set_active(&mut self, active: bool) {
        self.flags.active = active;
    }

    /// Set the staff flag.
    pub fn set_staff(&mut self, staff: bool) {
        self.flags.staff = staff;
    }

    pub(crate) fn set_identifier(&mut self, identifier: Identifier) {
        self.identifier = identifier;
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_label())
    }
}

/// Account about to be inserted; the store assigns the key.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub identifier: Identifier,
    pub email: Email,
    pub password: Option<Password>,
    pub flags: AccountFlags,
}

impl NewAccount {
    /// Build an insert request with default flags and no password.
    pub fn new(identifier: Identifier, email: Email) -> Self {
        Self {
            identifier,
            email,
            password: None,
            flags: AccountFlags::default(),
        }
    }

    /// Attach a password.
    pub fn with_password(mut self, password: Option<Password>) -> Self {
        self.password = password;
        self
    }

    /// Override the flags.
    pub fn with_flags(mut self, flags: AccountFlags) -> Self {
        self.flags = flags;
        self
    }
}
