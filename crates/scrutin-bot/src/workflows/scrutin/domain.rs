use chrono::NaiveDate;
use serde::Serialize;

/// The four choices shown in every derived view. Voluntary non-voters are
/// never displayed and therefore have no variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteChoice {
    For,
    Against,
    Abstentions,
    NonVoters,
}

impl VoteChoice {
    /// Stacking order used by both charts.
    pub const fn ordered() -> [Self; 4] {
        [Self::For, Self::Against, Self::Abstentions, Self::NonVoters]
    }

    /// Key used by the open-data `decompte` objects.
    pub const fn key(self) -> &'static str {
        match self {
            Self::For => "pour",
            Self::Against => "contre",
            Self::Abstentions => "abstentions",
            Self::NonVoters => "nonVotants",
        }
    }

    pub const fn label(self) -> &'static str {
        self.key()
    }
}

/// Vote counts for one entity, excluding voluntary non-voters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub for_votes: u32,
    pub against: u32,
    pub abstentions: u32,
    pub non_voters: u32,
}

impl Tally {
    pub const fn count(&self, choice: VoteChoice) -> u32 {
        match choice {
            VoteChoice::For => self.for_votes,
            VoteChoice::Against => self.against,
            VoteChoice::Abstentions => self.abstentions,
            VoteChoice::NonVoters => self.non_voters,
        }
    }

    /// Widened so four counts near `u32::MAX` still add up.
    pub fn displayed_total(&self) -> u64 {
        VoteChoice::ordered()
            .into_iter()
            .map(|choice| u64::from(self.count(choice)))
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupTally {
    pub organ_ref: String,
    pub members: u32,
    pub tally: Tally,
}

/// A single recorded vote of the assembly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoteRecord {
    pub id: String,
    pub date: NaiveDate,
    pub title: String,
    pub outcome_label: String,
    pub requester_text: Option<String>,
    pub total_voters: u32,
    pub tally: Tally,
    pub groups: Vec<GroupTally>,
}
