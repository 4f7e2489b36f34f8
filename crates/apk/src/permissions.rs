//! Dangerous-permission classification
//!
//! Android gates a handful of permission groups behind runtime user consent.
//! This module maps each dangerous permission identifier to its group; table
//! membership is the sole classification criterion, matched exactly and
//! case-sensitively against the identifiers a manifest requests.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// A runtime-consent permission group
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PermissionGroup {
    /// Calendar read/write access
    Calendar,
    /// Camera access
    Camera,
    /// Contacts and account access
    Contacts,
    /// Coarse and fine location
    Location,
    /// Audio recording
    Microphone,
    /// Telephony state, calls, and voicemail
    Phone,
    /// SMS, MMS, and WAP push
    Sms,
    /// Shared external storage
    Storage,
}

impl PermissionGroup {
    /// All groups, in display order
    pub const ALL: [PermissionGroup; 8] = [
        PermissionGroup::Calendar,
        PermissionGroup::Camera,
        PermissionGroup::Contacts,
        PermissionGroup::Location,
        PermissionGroup::Microphone,
        PermissionGroup::Phone,
        PermissionGroup::Sms,
        PermissionGroup::Storage,
    ];

    /// Upper-case group name
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionGroup::Calendar => "CALENDAR",
            PermissionGroup::Camera => "CAMERA",
            PermissionGroup::Contacts => "CONTACTS",
            PermissionGroup::Location => "LOCATION",
            PermissionGroup::Microphone => "MICROPHONE",
            PermissionGroup::Phone => "PHONE",
            PermissionGroup::Sms => "SMS",
            PermissionGroup::Storage => "STORAGE",
        }
    }
}

impl fmt::Display for PermissionGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static DANGEROUS_PERMISSIONS: Lazy<HashMap<&'static str, PermissionGroup>> = Lazy::new(|| {
    use PermissionGroup::*;
    HashMap::from([
        ("android.permission.READ_CALENDAR", Calendar),
        ("android.permission.WRITE_CALENDAR", Calendar),
        ("android.permission.CAMERA", Camera),
        ("android.permission.GET_ACCOUNTS", Contacts),
        ("android.permission.READ_CONTACTS", Contacts),
        ("android.permission.WRITE_CONTACTS", Contacts),
        ("android.permission.ACCESS_COARSE_LOCATION", Location),
        ("android.permission.ACCESS_FINE_LOCATION", Location),
        ("android.permission.RECORD_AUDIO", Microphone),
        ("android.permission.ACCESS_IMS_CALL_SERVICE", Phone),
        ("com.android.voicemail.permission.ADD_VOICEMAIL", Phone),
        ("android.permission.ANSWER_PHONE_CALLS", Phone),
        ("android.permission.CALL_PHONE", Phone),
        ("android.permission.PROCESS_OUTGOING_CALLS", Phone),
        ("android.permission.READ_CALL_LOG", Phone),
        ("android.permission.READ_PHONE_NUMBERS", Phone),
        ("android.permission.READ_PHONE_STATE", Phone),
        ("android.permission.USE_SIP", Phone),
        ("android.permission.WRITE_CALL_LOG", Phone),
        ("android.permission.READ_CELL_BROADCASTS", Sms),
        ("android.permission.READ_SMS", Sms),
        ("android.permission.RECEIVE_MMS", Sms),
        ("android.permission.RECEIVE_SMS", Sms),
        ("android.permission.RECEIVE_WAP_PUSH", Sms),
        ("android.permission.SEND_SMS", Sms),
        ("android.permission.READ_EXTERNAL_STORAGE", Storage),
        ("android.permission.WRITE_EXTERNAL_STORAGE", Storage),
        // Nonstandard identifiers seen in the wild; retained deliberately.
        ("android.permission.EXTERNAL_PUBLIC_STORAGE", Storage),
        ("android.permission.android.permission.EXTERNAL_PRIVATE_STORAGE", Storage),
    ])
});

/// Look up the dangerous group a permission belongs to
///
/// Unknown identifiers are `None`; they are merely not dangerous, never an
/// error.
pub fn group_of(identifier: &str) -> Option<PermissionGroup> {
    DANGEROUS_PERMISSIONS.get(identifier).copied()
}

/// Whether a single permission identifier is dangerous
pub fn is_dangerous(identifier: &str) -> bool {
    DANGEROUS_PERMISSIONS.contains_key(identifier)
}

/// Whether any permission in a set is dangerous
///
/// Short-circuits on the first dangerous identifier; an empty set is benign.
pub fn any_dangerous<I, S>(permissions: I) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    permissions.into_iter().any(|p| is_dangerous(p.as_ref()))
}

/// The dangerous groups a permission set touches
pub fn dangerous_groups<I, S>(permissions: I) -> BTreeSet<PermissionGroup>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    permissions
        .into_iter()
        .filter_map(|p| group_of(p.as_ref()))
        .collect()
}

/// All dangerous permission identifiers the classifier knows
pub fn known_permissions() -> impl Iterator<Item = &'static str> {
    DANGEROUS_PERMISSIONS.keys().copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_table_entry_is_dangerous() {
        for (permission, group) in DANGEROUS_PERMISSIONS.iter() {
            assert!(is_dangerous(permission), "{} not dangerous", permission);
            assert!(any_dangerous([*permission]), "{} alone not flagged", permission);
            assert_eq!(group_of(permission), Some(*group));
        }
    }

    #[test]
    fn test_table_size_and_group_closure() {
        assert_eq!(DANGEROUS_PERMISSIONS.len(), 29);

        let groups: BTreeSet<_> = DANGEROUS_PERMISSIONS.values().copied().collect();
        assert_eq!(groups.len(), PermissionGroup::ALL.len());
        for group in PermissionGroup::ALL {
            assert!(groups.contains(&group), "no permission maps to {}", group);
        }
    }

    #[test]
    fn test_unknown_identifiers_are_benign() {
        assert!(!is_dangerous("android.permission.INTERNET"));
        assert!(!is_dangerous("android.permission.VIBRATE"));
        assert_eq!(group_of("android.permission.INTERNET"), None);
    }

    #[test]
    fn test_lookup_is_case_sensitive_and_exact() {
        assert!(is_dangerous("android.permission.READ_CALENDAR"));
        assert!(!is_dangerous("android.permission.read_calendar"));
        assert!(!is_dangerous("READ_CALENDAR"));
    }

    #[test]
    fn test_nonstandard_entries_present() {
        assert_eq!(
            group_of("com.android.voicemail.permission.ADD_VOICEMAIL"),
            Some(PermissionGroup::Phone)
        );
        assert_eq!(
            group_of("android.permission.android.permission.EXTERNAL_PRIVATE_STORAGE"),
            Some(PermissionGroup::Storage)
        );
    }

    #[test]
    fn test_any_dangerous_empty_set() {
        assert!(!any_dangerous(std::iter::empty::<&str>()));
    }

    #[test]
    fn test_any_dangerous_benign_set() {
        assert!(!any_dangerous([
            "android.permission.INTERNET",
            "android.permission.ACCESS_NETWORK_STATE",
        ]));
    }

    #[test]
    fn test_any_dangerous_mixed_set() {
        assert!(any_dangerous([
            "android.permission.INTERNET",
            "android.permission.CAMERA",
        ]));
    }

    #[test]
    fn test_any_dangerous_short_circuits() {
        let permissions = std::iter::once("android.permission.CAMERA")
            .chain(std::iter::once_with(|| -> &str {
                panic!("inspected past the first dangerous permission")
            }));
        assert!(any_dangerous(permissions));
    }

    #[test]
    fn test_dangerous_groups_of_mixed_set() {
        let groups = dangerous_groups([
            "android.permission.CAMERA",
            "android.permission.READ_SMS",
            "android.permission.SEND_SMS",
            "android.permission.INTERNET",
        ]);
        let expected: BTreeSet<_> = [PermissionGroup::Camera, PermissionGroup::Sms]
            .into_iter()
            .collect();
        assert_eq!(groups, expected);
    }

    #[test]
    fn test_group_display_names() {
        let names: Vec<_> = PermissionGroup::ALL.iter().map(|g| g.to_string()).collect();
        assert_eq!(
            names,
            [
                "CALENDAR",
                "CAMERA",
                "CONTACTS",
                "LOCATION",
                "MICROPHONE",
                "PHONE",
                "SMS",
                "STORAGE"
            ]
        );
    }

    #[test]
    fn test_known_permissions_matches_table() {
        assert_eq!(known_permissions().count(), 29);
        assert!(known_permissions().any(|p| p == "android.permission.SEND_SMS"));
    }
}
