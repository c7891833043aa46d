//! Domain primitives, aggregates and services.
//!
//! Purpose: define strongly typed entities used by the API and persistence
//! layers, the ports adapters plug into, and the services implementing the
//! medication, reminder, account and disease use-cases.
//!
//! Public surface:
//! - Error (alias to `error::Error`): API error response payload.
//! - Medication, Reminder, User, Disease: aggregates with validated inputs.
//! - `expiry_date` and `ExpiryStatus`: expiry arithmetic.
//! - RecurrenceSpec: usage-schedule expansion.
//! - ReminderDispatcher: one dispatch scan over every channel.

pub mod auth;
pub mod disease;
pub mod disease_service;
pub mod error;
pub mod knowledge;
pub mod medication;
pub mod medication_service;
pub mod notification;
pub mod ports;
pub mod recurrence;
pub mod reminder;
pub mod reminder_dispatch;
pub mod reminder_service;
pub mod trace_id;
pub mod user;
pub mod user_account_service;

pub use self::auth::{
    AccessToken, IssuedToken, LoginCredentials, LoginValidationError, PASSWORD_MIN_LENGTH,
    PasswordDigest, PasswordError,
};
pub use self::disease::{
    Disease, DiseaseId, DiseaseValidationError, MedicationRecommendation, RecommendationId,
    RecommendationStrength,
};
pub use self::disease_service::DiseaseService;
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::knowledge::{MedicationInfo, MedicationNameError, validate_medication_name};
pub use self::medication::{
    DEFAULT_EXPIRY_WINDOW_DAYS, DEFAULT_UNIT, ExpiryStatus, Medication, MedicationChanges,
    MedicationDraft, MedicationId, MedicationValidationError, expiry_date,
};
pub use self::medication_service::MedicationService;
pub use self::notification::{ChannelKind, verification_code_message};
pub use self::recurrence::{RecurrenceKind, RecurrenceSpec, RecurrenceValidationError};
pub use self::reminder::{
    Reminder, ReminderDraft, ReminderId, ReminderKind, ReminderState, ReminderValidationError,
};
pub use self::reminder_dispatch::{
    ChannelTally, DispatchOutcome, ReminderDispatcher, ReminderDispatcherConfig,
    ReminderDispatcherPorts,
};
pub use self::reminder_service::{ExpirySchedulingOutcome, ReminderService, ReminderServicePorts};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{
    ContactBinding, EmailAddress, NotificationPreferences, PendingVerification, PhoneNumber,
    PhoneVerificationError, User, UserDraft, UserId, UserValidationError, Username,
    VerificationCode, WeChatOpenId,
};
pub use self::user_account_service::{UserAccountPorts, UserAccountService};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use medminder::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
