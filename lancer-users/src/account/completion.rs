use lancer_shared::types::auth::UserType;

use super::{Account, AccountField};

/// Which checklist applies. Admins are scored as clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Freelancer,
    Client,
}

impl From<UserType> for Role {
    fn from(user_type: UserType) -> Self {
        match user_type {
            UserType::Freelancer => Role::Freelancer,
            UserType::Client | UserType::Admin => Role::Client,
        }
    }
}

pub struct ChecklistItem {
    pub name: &'static str,
    pub present: fn(&Account) -> bool,
}

fn filled(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}

fn has_first_name(a: &Account) -> bool { filled(&a.first_name) }
fn has_last_name(a: &Account) -> bool { filled(&a.last_name) }
fn has_bio(a: &Account) -> bool { filled(&a.bio) }
fn has_phone_number(a: &Account) -> bool { filled(&a.phone_number) }
fn has_profile_picture(a: &Account) -> bool { filled(&a.profile_picture) }
fn has_location(a: &Account) -> bool { filled(&a.country) || filled(&a.city) }
fn has_title(a: &Account) -> bool { filled(&a.title) }
fn has_skills(a: &Account) -> bool { !a.skills.is_empty() }
fn has_experience_level(a: &Account) -> bool { filled(&a.experience_level) }
fn has_hourly_rate(a: &Account) -> bool { a.hourly_rate_cents.is_some() }
fn has_portfolio_url(a: &Account) -> bool { filled(&a.portfolio_url) }
fn has_company_name(a: &Account) -> bool { filled(&a.company_name) }
fn has_company_size(a: &Account) -> bool { filled(&a.company_size) }
fn has_industry(a: &Account) -> bool { filled(&a.industry) }

const fn item(name: &'static str, present: fn(&Account) -> bool) -> ChecklistItem {
    ChecklistItem { name, present }
}

static BASE: [ChecklistItem; 7] = [
    item("first_name", has_first_name),
    item("last_name", has_last_name),
    item("bio", has_bio),
    item("phone_number", has_phone_number),
    item("profile_picture", has_profile_picture),
    item("location", has_location),
    item("title", has_title),
];

static FREELANCER: [ChecklistItem; 4] = [
    item("skills", has_skills),
    item("experience_level", has_experience_level),
    item("hourly_rate", has_hourly_rate),
    item("portfolio_url", has_portfolio_url),
];

static CLIENT: [ChecklistItem; 3] = [
    item("company_name", has_company_name),
    item("company_size", has_company_size),
    item("industry", has_industry),
];

impl Role {
    pub fn checklist(self) -> impl Iterator<Item = &'static ChecklistItem> {
        let extra: &'static [ChecklistItem] = match self {
            Role::Freelancer => &FREELANCER,
            Role::Client => &CLIENT,
        };
        BASE.iter().chain(extra.iter())
    }
}

/// `floor(100 * present / total)` over the role's checklist.
pub fn completion_percentage(account: &Account) -> i32 {
    let role = Role::from(account.kind());
    let (present, total) = role
        .checklist()
        .fold((0, 0), |(present, total), item| {
            (present + (item.present)(account) as i32, total + 1)
        });
    if total == 0 {
        return 0;
    }
    100 * present / total
}

pub fn missing_fields(account: &Account) -> Vec<&'static str> {
    Role::from(account.kind())
        .checklist()
        .filter(|item| !(item.present)(account))
        .map(|item| item.name)
        .collect()
}

impl Account {
    /// Recomputes and caches the completion score.
    pub fn refresh_completion(&mut self) -> (i32, &'static [AccountField]) {
        let pct = completion_percentage(self);
        if pct == self.profile_completion_percentage {
            return (pct, AccountField::NONE);
        }
        self.profile_completion_percentage = pct;
        (pct, AccountField::COMPLETION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn freelancer() -> Account {
        Account::new("f@example.com", "hash", UserType::Freelancer)
    }

    #[test]
    fn checklist_sizes() {
        assert_eq!(Role::Freelancer.checklist().count(), 11);
        assert_eq!(Role::Client.checklist().count(), 10);
        assert_eq!(Role::from(UserType::Admin), Role::Client);
    }

    #[test]
    fn two_of_eleven_truncates_to_eighteen() {
        let mut acct = freelancer();
        acct.first_name = Some("Ada".into());
        acct.last_name = Some("Lovelace".into());
        assert_eq!(completion_percentage(&acct), 18);
    }

    #[test]
    fn empty_strings_and_skills_are_missing() {
        let mut acct = freelancer();
        acct.first_name = Some(String::new());
        acct.skills = Vec::new();
        assert_eq!(completion_percentage(&acct), 0);

        acct.skills = vec!["rust".into()];
        assert_eq!(completion_percentage(&acct), 9);
    }

    #[test]
    fn unknown_user_type_scores_as_client() {
        let mut acct = freelancer();
        acct.user_type = "robot".into();
        assert_eq!(acct.kind(), UserType::Client);
        assert_eq!(missing_fields(&acct).len(), Role::Client.checklist().count());
    }

    #[test]
    fn whitespace_counts_as_present() {
        let mut acct = freelancer();
        acct.bio = Some(" ".into());
        assert!(!missing_fields(&acct).contains(&"bio"));
    }

    #[test]
    fn city_alone_satisfies_location() {
        let mut acct = Account::new("c@example.com", "hash", UserType::Client);
        acct.city = Some("Lisbon".into());
        assert!(!missing_fields(&acct).contains(&"location"));
        assert_eq!(completion_percentage(&acct), 10);
    }

    #[test]
    fn full_client_profile_is_hundred() {
        let mut acct = Account::new("c@example.com", "hash", UserType::Client);
        acct.first_name = Some("Grace".into());
        acct.last_name = Some("Hopper".into());
        acct.bio = Some("Navy".into());
        acct.phone_number = Some("+15555550100".into());
        acct.profile_picture = Some("https://cdn/p.png".into());
        acct.country = Some("US".into());
        acct.title = Some("Rear Admiral".into());
        acct.company_name = Some("USN".into());
        acct.company_size = Some("large".into());
        acct.industry = Some("Defense".into());

        assert_eq!(completion_percentage(&acct), 100);
        assert!(missing_fields(&acct).is_empty());
    }

    #[test]
    fn zero_hourly_rate_counts() {
        let mut acct = freelancer();
        acct.hourly_rate_cents = Some(0);
        assert!(!missing_fields(&acct).contains(&"hourly_rate"));
    }

    #[test]
    fn refresh_is_idempotent() {
        let mut acct = freelancer();
        acct.first_name = Some("Ada".into());
        acct.last_name = Some("Lovelace".into());

        assert_eq!(acct.refresh_completion(), (18, AccountField::COMPLETION));
        assert_eq!(acct.profile_completion_percentage, 18);
        assert_eq!(acct.refresh_completion(), (18, AccountField::NONE));
    }
}
