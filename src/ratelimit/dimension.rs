//! Rate limit dimensions and their evaluation order.

use serde::{Deserialize, Serialize};

/// A dimension an import is counted against.
///
/// Every import is evaluated against all three dimensions; when more than
/// one is exhausted at once, the first in [`IN_PRIORITY_ORDER`] is the one
/// reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitDimension {
    /// The account performing the import.
    User,
    /// The client address the request arrived from.
    Ip,
    /// The wallet receiving the imported transactions.
    Wallet,
}

/// Evaluation order for dimension checks: user first, then IP, then wallet.
pub const IN_PRIORITY_ORDER: [LimitDimension; 3] = [
    LimitDimension::User,
    LimitDimension::Ip,
    LimitDimension::Wallet,
];

impl LimitDimension {
    /// Short lowercase name, as used in log fields and denial messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            LimitDimension::User => "user",
            LimitDimension::Ip => "ip",
            LimitDimension::Wallet => "wallet",
        }
    }
}

impl std::fmt::Display for LimitDimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_order_is_user_ip_wallet() {
        assert_eq!(
            IN_PRIORITY_ORDER,
            [
                LimitDimension::User,
                LimitDimension::Ip,
                LimitDimension::Wallet
            ]
        );
    }

    #[test]
    fn test_display_matches_as_str() {
        for dimension in IN_PRIORITY_ORDER {
            assert_eq!(dimension.to_string(), dimension.as_str());
        }
    }

    #[test]
    fn test_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&LimitDimension::Wallet).unwrap(),
            "\"wallet\""
        );
    }
}
