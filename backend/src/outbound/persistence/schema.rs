//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the migrations under `backend/migrations`
//! exactly. They are used by Diesel for compile-time query validation and
//! type-safe SQL generation.
//!
//! # Maintenance
//!
//! When migrations change the schema, this file should be regenerated or
//! manually updated to reflect those changes. The `diesel print-schema`
//! command can generate these definitions from a live database.

diesel::table! {
    /// User accounts with contact bindings and channel preferences.
    users (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Unique login name.
        username -> Varchar,
        /// Argon2id digest in PHC format.
        password_hash -> Text,
        /// Bound phone number, unique across users.
        phone -> Nullable<Varchar>,
        phone_verified -> Bool,
        /// Bound WeChat openid, unique across users.
        wechat_openid -> Nullable<Varchar>,
        wechat_verified -> Bool,
        /// Bound email address, unique across users.
        email -> Nullable<Varchar>,
        email_verified -> Bool,
        notify_sms -> Bool,
        notify_wechat -> Bool,
        notify_email -> Bool,
        /// Outstanding phone verification code.
        verification_code -> Nullable<Varchar>,
        verification_issued_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Medications owned by users.
    ///
    /// `expiry_date` is derived and stored so expiry scans can use an index.
    medications (id) {
        id -> Uuid,
        user_id -> Uuid,
        name -> Varchar,
        production_date -> Nullable<Date>,
        shelf_life_days -> Nullable<Int4>,
        expiry_date -> Nullable<Date>,
        quantity -> Float8,
        unit -> Varchar,
        efficacy -> Nullable<Text>,
        usage -> Nullable<Text>,
        image_url -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Expiry and usage reminders.
    ///
    /// A row is pending while both `sent_at` and `missed_at` are null.
    reminders (id) {
        id -> Uuid,
        user_id -> Uuid,
        medication_id -> Uuid,
        /// `expiry` or `usage`.
        kind -> Varchar,
        scheduled_at -> Timestamptz,
        message -> Nullable<Varchar>,
        sent_at -> Nullable<Timestamptz>,
        missed_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Disease catalogue.
    diseases (id) {
        id -> Uuid,
        name -> Varchar,
        description -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Medications recommended for a disease, unique per disease and name.
    medication_recommendations (id) {
        id -> Uuid,
        disease_id -> Uuid,
        medication_name -> Varchar,
        /// 1 (weak) to 5 (strong).
        strength -> Int2,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(medications -> users (user_id));
diesel::joinable!(reminders -> users (user_id));
diesel::joinable!(reminders -> medications (medication_id));
diesel::joinable!(medication_recommendations -> diseases (disease_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    medications,
    reminders,
    diseases,
    medication_recommendations,
);
