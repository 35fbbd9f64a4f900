//! Department taxonomy, keyword routing, and the contact directory.

use std::fmt;

/// Fallback contact address used when a department cannot be resolved.
pub const DEFAULT_SUPPORT_EMAIL: &str = "support@airline.com";

/// Internal departments that escalations can be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Department {
    /// Lost, delayed, and damaged baggage; allowance questions.
    BaggageServices,
    /// Bookings, refunds, check-in assistance, loyalty programs.
    CustomerExperience,
    /// Delays, cancellations, rebooking, disruption compensation.
    FlightOperations,
    /// Accessibility, medical accommodations, pet travel.
    SpecialServices,
    /// Data protection, identity verification, crisis support.
    SecurityAndCompliance,
}

impl Department {
    /// All departments in routing priority order.
    pub const ALL: [Department; 5] = [
        Department::BaggageServices,
        Department::CustomerExperience,
        Department::FlightOperations,
        Department::SpecialServices,
        Department::SecurityAndCompliance,
    ];

    /// Canonical display name used in prompts, emails, and responses.
    pub fn name(&self) -> &'static str {
        match self {
            Department::BaggageServices => "Baggage Services Department",
            Department::CustomerExperience => "Customer Experience Department",
            Department::FlightOperations => "Flight Operations Department",
            Department::SpecialServices => "Special Services Department",
            Department::SecurityAndCompliance => "Security and Compliance Department",
        }
    }

    /// Find a canonical department name inside a model reply.
    pub fn match_reply(reply: &str) -> Option<Department> {
        let lowered = reply.to_lowercase();
        Department::ALL
            .into_iter()
            .find(|department| lowered.contains(&department.name().to_lowercase()))
    }

    /// Deterministic keyword routing used when the model reply is ambiguous.
    ///
    /// Keyword sets are checked in a fixed priority order; the first set with
    /// a hit wins.
    pub fn match_keywords(query: &str) -> Option<Department> {
        const BAGGAGE: [&str; 6] = ["baggage", "luggage", "bag", "suitcase", "carry-on", "weight"];
        const EXPERIENCE: [&str; 7] = [
            "booking",
            "reservation",
            "cancel",
            "refund",
            "check-in",
            "upgrade",
            "loyalty",
        ];
        const OPERATIONS: [&str; 5] = [
            "delay",
            "cancel flight",
            "cancelled flight",
            "compensation",
            "disruption",
        ];
        const SPECIAL: [&str; 6] = [
            "wheelchair",
            "disability",
            "medical",
            "assistance",
            "pet",
            "animal",
        ];
        const SECURITY: [&str; 4] = ["privacy", "security", "identity", "emergency contact"];

        let lowered = query.to_lowercase();
        let groups: [(&[&str], Department); 5] = [
            (&BAGGAGE, Department::BaggageServices),
            (&EXPERIENCE, Department::CustomerExperience),
            (&OPERATIONS, Department::FlightOperations),
            (&SPECIAL, Department::SpecialServices),
            (&SECURITY, Department::SecurityAndCompliance),
        ];

        groups
            .into_iter()
            .find(|(keywords, _)| keywords.iter().any(|keyword| lowered.contains(keyword)))
            .map(|(_, department)| department)
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolves a department name to a contact email address.
pub trait DepartmentDirectory: Send + Sync {
    /// Look up the contact address: exact case-insensitive match, then a
    /// partial match on the first word of the name, then the fallback.
    fn lookup(&self, name: &str) -> String;
}

/// In-memory directory seeded with the standard department addresses.
pub struct StaticDepartmentDirectory {
    entries: Vec<(String, String)>,
    fallback: String,
}

impl StaticDepartmentDirectory {
    /// Build a directory with the default contact addresses.
    pub fn with_defaults(fallback: Option<String>) -> Self {
        let entries = vec![
            (
                "Baggage Services Department".to_string(),
                "baggage.services@airline.com".to_string(),
            ),
            (
                "Customer Experience Department".to_string(),
                "customer.experience@airline.com".to_string(),
            ),
            (
                "Flight Operations Department".to_string(),
                "flight.operations@airline.com".to_string(),
            ),
            (
                "Special Services Department".to_string(),
                "special.services@airline.com".to_string(),
            ),
            (
                "Security and Compliance Department".to_string(),
                "security.compliance@airline.com".to_string(),
            ),
        ];
        Self {
            entries,
            fallback: fallback.unwrap_or_else(|| DEFAULT_SUPPORT_EMAIL.to_string()),
        }
    }
}

impl DepartmentDirectory for StaticDepartmentDirectory {
    fn lookup(&self, name: &str) -> String {
        let lowered = name.to_lowercase();
        if let Some((_, email)) = self
            .entries
            .iter()
            .find(|(entry_name, _)| entry_name.to_lowercase() == lowered)
        {
            return email.clone();
        }

        if let Some(first_word) = lowered.split_whitespace().next()
            && let Some((_, email)) = self
                .entries
                .iter()
                .find(|(entry_name, _)| entry_name.to_lowercase().contains(first_word))
        {
            tracing::debug!(name, email = %email, "Resolved department by partial match");
            return email.clone();
        }

        tracing::warn!(name, "No contact address for department; using fallback");
        self.fallback.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_fallback_routes_baggage_queries() {
        assert_eq!(
            Department::match_keywords("My bag was lost"),
            Some(Department::BaggageServices)
        );
        assert_eq!(
            Department::match_keywords("excess LUGGAGE weight charges"),
            Some(Department::BaggageServices)
        );
    }

    #[test]
    fn keyword_priority_is_fixed() {
        // "cancel" hits Customer Experience before Flight Operations sees "cancel flight".
        assert_eq!(
            Department::match_keywords("I want to cancel flight LH123"),
            Some(Department::CustomerExperience)
        );
        // "pet" only appears in the Special Services set.
        assert_eq!(
            Department::match_keywords("traveling with my pet parrot"),
            Some(Department::SpecialServices)
        );
        assert_eq!(
            Department::match_keywords("who sees my emergency contact data"),
            Some(Department::SecurityAndCompliance)
        );
    }

    #[test]
    fn unmatched_queries_route_nowhere() {
        assert_eq!(Department::match_keywords("what movies are on board"), None);
    }

    #[test]
    fn reply_matching_is_case_insensitive_substring() {
        assert_eq!(
            Department::match_reply("The answer is: baggage services department."),
            Some(Department::BaggageServices)
        );
        assert_eq!(Department::match_reply("I cannot decide."), None);
    }

    #[test]
    fn directory_resolves_exact_then_partial_then_fallback() {
        let directory = StaticDepartmentDirectory::with_defaults(None);

        assert_eq!(
            directory.lookup("baggage services department"),
            "baggage.services@airline.com"
        );
        assert_eq!(
            directory.lookup("Security desk"),
            "security.compliance@airline.com"
        );
        assert_eq!(directory.lookup("Catering Department"), DEFAULT_SUPPORT_EMAIL);
    }

    #[test]
    fn directory_honors_custom_fallback() {
        let directory =
            StaticDepartmentDirectory::with_defaults(Some("help@example.com".to_string()));
        assert_eq!(directory.lookup("Unknown Team"), "help@example.com");
    }
}
