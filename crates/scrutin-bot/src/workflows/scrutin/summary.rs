use super::charts::{GroupBreakdownChart, ProportionChart, Slice, StackedRow};
use super::domain::{VoteChoice, VoteRecord};
use super::parser;
use super::ScrutinError;
use std::io::Read;
use std::path::Path;
use tracing::warn;

const ASSEMBLY_NAME: &str = "Assemblée nationale";
pub const ASSEMBLY_HANDLE: &str = "@AssembleeNat";
pub const CAMPAIGN_HASHTAG: &str = "#DirectAN";
const TOTAL_ROW: &str = "total";

/// Read-only views derived from one [`VoteRecord`].
#[derive(Debug, Clone)]
pub struct VoteSummary {
    record: VoteRecord,
}

impl VoteSummary {
    pub fn new(record: VoteRecord) -> Self {
        Self { record }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ScrutinError> {
        let file = std::fs::File::open(path)?;
        Self::load(std::io::BufReader::new(file))
    }

    pub fn load<R: Read>(reader: R) -> Result<Self, ScrutinError> {
        parser::parse_document(reader).map(Self::new)
    }

    pub fn record(&self) -> &VoteRecord {
        &self.record
    }

    pub fn id(&self) -> &str {
        &self.record.id
    }

    pub fn formatted_date(&self) -> String {
        self.record.date.format("%d/%m/%Y").to_string()
    }

    /// Outcome label with the assembly swapped for its handle, then the title.
    pub fn full_title(&self) -> String {
        let outcome = mention_assembly(&self.record.outcome_label);
        [outcome.trim(), self.record.title.as_str()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn synthesis_line(&self) -> String {
        let tally = &self.record.tally;
        format!(
            "{} votants, {} pour, {} contre, {} abstentions",
            self.record.total_voters, tally.for_votes, tally.against, tally.abstentions
        )
    }

    pub fn requester_line(&self) -> Option<String> {
        self.record
            .requester_text
            .as_deref()
            .map(|requester| format!("(Par {requester})"))
    }

    pub fn status_text(&self) -> String {
        [
            format!("{}: {}", self.formatted_date(), self.full_title()),
            self.synthesis_line(),
            CAMPAIGN_HASHTAG.to_string(),
        ]
        .join("\n")
    }

    pub fn proportion_chart(&self) -> ProportionChart {
        let slices = VoteChoice::ordered()
            .into_iter()
            .map(|choice| Slice::new(choice, self.record.tally.count(choice)))
            .collect();
        ProportionChart { slices }
    }

    /// Rows are the `total` row then each group. A row whose displayed
    /// votes exceed its reference is kept as is (its bar runs past the end)
    /// and logged.
    pub fn group_chart(&self) -> GroupBreakdownChart {
        let record = &self.record;
        let rows = std::iter::once((TOTAL_ROW, record.total_voters, &record.tally))
            .chain(
                record
                    .groups
                    .iter()
                    .map(|group| (group.organ_ref.as_str(), group.members, &group.tally)),
            )
            .map(|(name, reference, tally)| {
                if tally.displayed_total() > u64::from(reference) {
                    warn!(
                        vote = %record.id,
                        row = name,
                        reference,
                        counted = tally.displayed_total(),
                        "displayed votes exceed the row reference"
                    );
                }
                StackedRow::from_tally(name, reference, tally)
            })
            .collect();

        GroupBreakdownChart { rows }
    }
}

fn mention_assembly(label: &str) -> String {
    let mut mentioned = label.to_string();
    for article in ["l'", "L'", "l’", "L’"] {
        mentioned = mentioned.replace(&format!("{article}{ASSEMBLY_NAME}"), ASSEMBLY_HANDLE);
    }
    mentioned.replace(ASSEMBLY_NAME, ASSEMBLY_HANDLE)
}
