use super::{GroupBreakdownChart, ProportionChart, Rgb, BAR_LENGTH};
use crate::workflows::scrutin::{VoteChoice, VoteSummary};
use plotters::coord::ranged1d::SegmentValue;
use plotters::prelude::*;
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{fontdb, Options, Tree};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

const PROPORTION_FILE: &str = "proportion.png";
const GROUP_BREAKDOWN_FILE: &str = "group_breakdown.png";
const PROPORTION_SIZE: (u32, u32) = (600, 600);
const GROUP_BREAKDOWN_SIZE: (u32, u32) = (1200, 800);
const FONT: &str = "sans-serif";

#[derive(Debug, thiserror::Error)]
pub enum ChartError {
    #[error("unable to write chart at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("vote id '{0}' cannot be used as a directory name")]
    InvalidVoteId(String),
    #[error("chart drawing failed: {0}")]
    Draw(String),
    #[error("chart rasterisation failed: {0}")]
    Raster(String),
}

/// Image paths produced for one vote, in attachment order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedCharts {
    pub proportion: PathBuf,
    pub group_breakdown: PathBuf,
}

impl RenderedCharts {
    pub fn paths(&self) -> Vec<PathBuf> {
        vec![self.proportion.clone(), self.group_breakdown.clone()]
    }
}

/// Draws chart descriptions as SVG with plotters and rasterises them to PNG under
/// `<media_root>/<vote id>/`.
pub struct ChartRenderer {
    media_root: PathBuf,
    fonts: Arc<fontdb::Database>,
}

impl ChartRenderer {
    pub fn new(media_root: impl Into<PathBuf>) -> Result<Self, ChartError> {
        let media_root = media_root.into();
        std::fs::create_dir_all(&media_root).map_err(|source| ChartError::Io {
            path: media_root.clone(),
            source,
        })?;

        let mut fonts = fontdb::Database::new();
        fonts.load_system_fonts();

        Ok(Self {
            media_root,
            fonts: Arc::new(fonts),
        })
    }

    pub fn media_root(&self) -> &Path {
        &self.media_root
    }

    pub fn render(&self, summary: &VoteSummary) -> Result<RenderedCharts, ChartError> {
        let vote_dir = self.ensure_vote_dir(summary.id())?;

        let proportion = vote_dir.join(PROPORTION_FILE);
        self.render_proportion(&summary.proportion_chart(), &proportion)?;

        let group_breakdown = vote_dir.join(GROUP_BREAKDOWN_FILE);
        self.render_group_breakdown(&summary.group_chart(), &group_breakdown)?;

        Ok(RenderedCharts {
            proportion,
            group_breakdown,
        })
    }

    pub fn render_proportion(&self, chart: &ProportionChart, path: &Path) -> Result<(), ChartError> {
        let svg = draw_proportion(chart, PROPORTION_SIZE)?;
        self.write_png(&svg, path)
    }

    pub fn render_group_breakdown(
        &self,
        chart: &GroupBreakdownChart,
        path: &Path,
    ) -> Result<(), ChartError> {
        let svg = draw_group_breakdown(chart, GROUP_BREAKDOWN_SIZE)?;
        self.write_png(&svg, path)
    }

    fn ensure_vote_dir(&self, vote_id: &str) -> Result<PathBuf, ChartError> {
        let usable = !vote_id.is_empty()
            && vote_id != "."
            && vote_id != ".."
            && !vote_id.contains(['/', '\\']);
        if !usable {
            return Err(ChartError::InvalidVoteId(vote_id.to_string()));
        }

        let dir = self.media_root.join(vote_id);
        std::fs::create_dir_all(&dir).map_err(|source| ChartError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(dir)
    }

    fn write_png(&self, svg: &str, path: &Path) -> Result<(), ChartError> {
        let options = Options {
            fontdb: self.fonts.clone(),
            ..Options::default()
        };
        let tree = Tree::from_str(svg, &options).map_err(raster_error)?;

        let size = tree.size();
        let mut pixmap = Pixmap::new(size.width() as u32, size.height() as u32)
            .ok_or_else(|| ChartError::Raster("chart canvas has no area".to_string()))?;
        resvg::render(&tree, Transform::identity(), &mut pixmap.as_mut());

        let bytes = pixmap.encode_png().map_err(raster_error)?;
        std::fs::write(path, bytes).map_err(|source| ChartError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "chart written");
        Ok(())
    }
}

impl std::fmt::Debug for ChartRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChartRenderer")
            .field("media_root", &self.media_root)
            .finish_non_exhaustive()
    }
}

fn draw_proportion(chart: &ProportionChart, (width, height): (u32, u32)) -> Result<String, ChartError> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_error)?;

        let caption_height = 40;
        let (ring_area, caption_area) = root.split_vertically(height as i32 - caption_height);

        // Empty slices are dropped so their labels do not pile up on the ring.
        let shown: Vec<_> = chart.slices.iter().filter(|slice| slice.value > 0).collect();
        if shown.is_empty() {
            ring_area
                .draw_text(
                    "Aucun vote décompté",
                    &TextStyle::from((FONT, 24).into_font()).color(&BLACK),
                    (width as i32 / 2 - 110, (height as i32 - caption_height) / 2),
                )
                .map_err(draw_error)?;
        } else {
            let sizes: Vec<f64> = shown.iter().map(|slice| f64::from(slice.value)).collect();
            let colors: Vec<RGBColor> = shown.iter().map(|slice| to_rgb(slice.color)).collect();
            let labels: Vec<&str> = shown.iter().map(|slice| slice.choice.label()).collect();

            let center = (width as i32 / 2, (height as i32 - caption_height) / 2);
            let radius = f64::from(width.min(height)) * 0.33;
            let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
            pie.start_angle(-90.0);
            pie.label_style((FONT, 18).into_font().color(&BLACK));
            pie.percentages((FONT, 16).into_font().color(&BLACK));
            ring_area.draw(&pie).map_err(draw_error)?;
        }

        caption_area
            .draw_text(
                "Répartition des choix au vote",
                &TextStyle::from((FONT, 18).into_font()).color(&BLACK),
                (width as i32 / 2 - 120, 10),
            )
            .map_err(draw_error)?;

        root.present().map_err(draw_error)?;
    }
    Ok(svg)
}

fn draw_group_breakdown(
    chart: &GroupBreakdownChart,
    (width, height): (u32, u32),
) -> Result<String, ChartError> {
    let row_count = chart.rows.len();
    if row_count == 0 {
        return Err(ChartError::Draw("group breakdown has no rows".to_string()));
    }
    let names: Vec<&str> = chart.rows.iter().map(|row| row.name.as_str()).collect();

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_error)?;

        let mut context = ChartBuilder::on(&root)
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(110)
            .build_cartesian_2d(0f64..BAR_LENGTH, (0..row_count).into_segmented())
            .map_err(draw_error)?;

        let row_label = |value: &SegmentValue<usize>| match value {
            SegmentValue::CenterOf(slot) if *slot < row_count => {
                names[row_count - 1 - slot].to_string()
            }
            _ => String::new(),
        };

        context
            .configure_mesh()
            .disable_y_mesh()
            .y_labels(row_count)
            .y_label_formatter(&row_label)
            .x_desc("Répartition des choix au vote, par groupe parlementaire")
            .draw()
            .map_err(draw_error)?;

        let total_color = to_rgb(Rgb::TOTAL);
        context
            .draw_series(
                (0..row_count).map(|index| bar(row_count, index, 0.0, BAR_LENGTH, total_color)),
            )
            .map_err(draw_error)?
            .label("total")
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], total_color.filled()));

        for choice in VoteChoice::ordered() {
            let color = to_rgb(Rgb::for_choice(choice));
            context
                .draw_series(chart.rows.iter().enumerate().filter_map(|(index, row)| {
                    row.segment(choice)
                        .filter(|segment| segment.percentage > 0.0)
                        .map(|segment| bar(row_count, index, segment.offset, segment.end(), color))
                }))
                .map_err(draw_error)?
                .label(choice.label())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
        }

        context
            .configure_series_labels()
            .position(SeriesLabelPosition::LowerRight)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(draw_error)?;

        root.present().map_err(draw_error)?;
    }
    Ok(svg)
}

/// First row is drawn at the top of the chart.
fn bar(
    row_count: usize,
    index: usize,
    start: f64,
    end: f64,
    color: RGBColor,
) -> Rectangle<(f64, SegmentValue<usize>)> {
    let slot = row_count - 1 - index;
    let mut bar = Rectangle::new(
        [
            (start, SegmentValue::Exact(slot)),
            (end, SegmentValue::Exact(slot + 1)),
        ],
        color.filled(),
    );
    bar.set_margin(6, 6, 0, 0);
    bar
}

fn to_rgb(color: Rgb) -> RGBColor {
    RGBColor(color.0, color.1, color.2)
}

fn draw_error<E: std::fmt::Display>(err: E) -> ChartError {
    ChartError::Draw(err.to_string())
}

fn raster_error<E: std::fmt::Display>(err: E) -> ChartError {
    ChartError::Raster(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::scrutin::{Slice, StackedRow, Tally};

    #[test]
    fn proportion_svg_mentions_every_counted_choice() {
        let chart = ProportionChart {
            slices: vec![
                Slice::new(VoteChoice::For, 200),
                Slice::new(VoteChoice::Against, 100),
                Slice::new(VoteChoice::Abstentions, 0),
                Slice::new(VoteChoice::NonVoters, 10),
            ],
        };
        let svg = draw_proportion(&chart, PROPORTION_SIZE).expect("svg drawn");
        assert!(svg.contains("pour"));
        assert!(svg.contains("nonVotants"));
        assert!(!svg.contains(">abstentions<"));
    }

    #[test]
    fn breakdown_svg_labels_each_row() {
        let tally = Tally {
            for_votes: 50,
            against: 20,
            abstentions: 5,
            non_voters: 1,
        };
        let chart = GroupBreakdownChart {
            rows: vec![
                StackedRow::from_tally("total", 100, &tally),
                StackedRow::from_tally("PO800538", 90, &tally),
            ],
        };
        let svg = draw_group_breakdown(&chart, GROUP_BREAKDOWN_SIZE).expect("svg drawn");
        assert!(svg.contains("PO800538"));
        assert!(svg.contains("par groupe parlementaire"));
    }

    #[test]
    fn rejects_vote_ids_that_escape_the_media_root() {
        let root = tempfile::tempdir().expect("tempdir");
        let renderer = ChartRenderer::new(root.path()).expect("renderer");
        for id in ["", "..", "../etc", "a/b"] {
            assert!(matches!(
                renderer.ensure_vote_dir(id),
                Err(ChartError::InvalidVoteId(_))
            ));
        }
    }
}
