mod render;

pub use render::{ChartError, ChartRenderer, RenderedCharts};

use super::domain::{Tally, VoteChoice};
use serde::Serialize;

/// Full length of every bar in the group breakdown.
pub const BAR_LENGTH: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const TOTAL: Rgb = Rgb(0x26, 0x63, 0xd9);

    pub const fn for_choice(choice: VoteChoice) -> Self {
        match choice {
            VoteChoice::For => Rgb(0x26, 0xd9, 0x78),
            VoteChoice::Against => Rgb(0xd9, 0x31, 0x26),
            VoteChoice::Abstentions => Rgb(0xa8, 0xb9, 0xe8),
            VoteChoice::NonVoters => Rgb(0x95, 0x95, 0x95),
        }
    }

    pub fn hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Slice {
    pub choice: VoteChoice,
    pub value: u32,
    pub color: Rgb,
}

impl Slice {
    pub fn new(choice: VoteChoice, value: u32) -> Self {
        Self {
            choice,
            value,
            color: Rgb::for_choice(choice),
        }
    }
}

/// One ring, one slice per displayed choice. Values are raw counts.
#[derive(Debug, Clone, Serialize)]
pub struct ProportionChart {
    pub slices: Vec<Slice>,
}

impl ProportionChart {
    pub fn total(&self) -> u64 {
        self.slices.iter().map(|slice| u64::from(slice.value)).sum()
    }

    pub fn percentages(&self) -> Vec<(VoteChoice, f64)> {
        let total = self.total();
        self.slices
            .iter()
            .map(|slice| (slice.choice, percentage_of(u64::from(slice.value), total)))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Segment {
    pub choice: VoteChoice,
    pub percentage: f64,
    /// Where the segment starts on the bar, i.e. the sum of the segments before it.
    pub offset: f64,
}

impl Segment {
    pub fn end(&self) -> f64 {
        self.offset + self.percentage
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StackedRow {
    pub name: String,
    /// Count the percentages are taken against: voters for the total row,
    /// membership for a group.
    pub reference: u32,
    pub segments: Vec<Segment>,
    /// Part of the bar not covered by any segment.
    pub absent: f64,
}

impl StackedRow {
    pub fn from_tally(name: &str, reference: u32, tally: &Tally) -> Self {
        let mut offset = 0.0;
        let segments: Vec<Segment> = VoteChoice::ordered()
            .into_iter()
            .map(|choice| {
                let percentage = percentage_of(u64::from(tally.count(choice)), u64::from(reference));
                let segment = Segment {
                    choice,
                    percentage,
                    offset,
                };
                offset += percentage;
                segment
            })
            .collect();

        Self {
            name: name.to_string(),
            reference,
            segments,
            absent: (BAR_LENGTH - offset).max(0.0),
        }
    }

    pub fn percentage(&self, choice: VoteChoice) -> f64 {
        self.segment(choice)
            .map(|segment| segment.percentage)
            .unwrap_or_default()
    }

    pub fn segment(&self, choice: VoteChoice) -> Option<&Segment> {
        self.segments.iter().find(|segment| segment.choice == choice)
    }

    pub fn stacked_end(&self) -> f64 {
        self.segments.last().map(Segment::end).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupBreakdownChart {
    pub rows: Vec<StackedRow>,
}

fn percentage_of(count: u64, reference: u64) -> f64 {
    if reference == 0 {
        return 0.0;
    }
    BAR_LENGTH * count as f64 / reference as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_and_absent_fill_the_bar() {
        let tally = Tally {
            for_votes: 37,
            against: 11,
            abstentions: 5,
            non_voters: 2,
        };
        for members in [55, 89, 170, 577] {
            let row = StackedRow::from_tally("PO800502", members, &tally);
            let filled: f64 = row.segments.iter().map(|segment| segment.percentage).sum();
            assert!((filled + row.absent - BAR_LENGTH).abs() < 1e-9, "members={members}");
            assert!((row.stacked_end() - filled).abs() < 1e-9);
        }
    }

    #[test]
    fn offsets_accumulate_in_display_order() {
        let tally = Tally {
            for_votes: 10,
            against: 20,
            abstentions: 30,
            non_voters: 40,
        };
        let row = StackedRow::from_tally("total", 100, &tally);
        let offsets: Vec<f64> = row.segments.iter().map(|segment| segment.offset).collect();
        assert_eq!(offsets, vec![0.0, 10.0, 30.0, 60.0]);
        assert_eq!(row.stacked_end(), 100.0);
        assert_eq!(row.absent, 0.0);
    }

    #[test]
    fn zero_reference_leaves_an_empty_bar() {
        let row = StackedRow::from_tally("PO000000", 0, &Tally::default());
        assert!(row.segments.iter().all(|segment| segment.percentage == 0.0));
        assert_eq!(row.absent, BAR_LENGTH);
    }

    #[test]
    fn palette_matches_published_colors() {
        assert_eq!(Rgb::for_choice(VoteChoice::For).hex(), "#26d978");
        assert_eq!(Rgb::for_choice(VoteChoice::Against).hex(), "#d93126");
        assert_eq!(Rgb::for_choice(VoteChoice::Abstentions).hex(), "#a8b9e8");
        assert_eq!(Rgb::for_choice(VoteChoice::NonVoters).hex(), "#959595");
        assert_eq!(Rgb::TOTAL.hex(), "#2663d9");
    }

    #[test]
    fn empty_ring_reports_zero_percentages() {
        let chart = ProportionChart {
            slices: VoteChoice::ordered()
                .into_iter()
                .map(|choice| Slice::new(choice, 0))
                .collect(),
        };
        assert!(chart.percentages().iter().all(|(_, pct)| *pct == 0.0));
    }
}
