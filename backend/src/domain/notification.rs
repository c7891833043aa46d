//! Notification channel kinds shared by users, the dispatcher and adapters.

use std::fmt;

/// Delivery channel variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChannelKind {
    /// Text message to a verified phone number.
    Sms,
    /// WeChat message to a bound openid.
    WeChat,
    /// Email to a bound address.
    Email,
}

impl ChannelKind {
    /// All channel kinds in delivery order.
    pub const ALL: [Self; 3] = [Self::Sms, Self::WeChat, Self::Email];

    /// Stable lowercase label used in logs and payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sms => "sms",
            Self::WeChat => "wechat",
            Self::Email => "email",
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verification code message sent when a phone number is bound.
pub fn verification_code_message(code: &str) -> String {
    format!("Your verification code is {code}, valid for 5 minutes. Please do not share it.")
}
