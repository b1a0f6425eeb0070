//! Trend widget: plots one trace per VALUE binding from a bounded sample
//! buffer. Expired samples become gaps in the trace, never interpolated
//! line segments.

use chrono::{DateTime, Utc};
use opsview_model::markup::NodeRef;
use opsview_model::{AcquisitionStatus, Color, ParameterSample, Sample};
use tracing::warn;

use crate::binding::{DataSourceBinding, DynamicProperty};
use crate::buffer::{CircularBuffer, ExpirationBuffer, SampleBuffer};
use crate::scene::{NodeKind, Scene, SceneId};
use crate::style::{write_text, HorizontalAlignment, QualityState, TextStyle, VerticalAlignment};
use crate::widgets::{Bounds, StandardOptions, WidgetError};

const PLOT_COLORS: [Color; 6] = [
    Color::BLACK,
    Color::new(0, 0, 255, 255),
    Color::new(0, 210, 213, 255),
    Color::new(231, 41, 138, 255),
    Color::new(65, 171, 93, 255),
    Color::new(102, 194, 165, 255),
];

const TITLE_HEIGHT: f64 = 14.0;
const LEGEND_ROW_HEIGHT: f64 = 12.0;
const LEGEND_BOX_WIDTH: f64 = 60.0;
const MARGIN_LEFT: f64 = 40.0;
const MARGIN_RIGHT: f64 = 10.0;
const MARGIN_BOTTOM: f64 = 20.0;
const DEFAULT_SAMPLE_CAPACITY: i32 = 100;

struct Series {
    ops_name: String,
    using_raw: bool,
    buffer: Box<dyn SampleBuffer>,
    last: Option<ParameterSample>,
    trace_id: SceneId,
    legend_value_id: Option<SceneId>,
    legend_background_id: Option<SceneId>,
}

pub struct LineGraph {
    series: Vec<Series>,
    plot_x: f64,
    plot_y: f64,
    plot_w: f64,
    plot_h: f64,
    fixed_range: Option<(f64, f64)>,
    legend_decimals: usize,
}

impl LineGraph {
    pub(crate) fn parse_and_draw(
        node: NodeRef<'_>,
        opts: &StandardOptions,
        bindings: &[DataSourceBinding],
        scene: &mut Scene,
        group: SceneId,
    ) -> Result<Self, WidgetError> {
        let title = node.parse_string_child_or("Title", "");
        let graph_background = node.parse_color_child_or("GraphBackgroundColor", Color::WHITE)?;
        let plot_background = node.parse_color_child_or("PlotBackgroundColor", Color::WHITE)?;
        let legend_enabled = node.parse_boolean_child_or("LegendEnabled", false);
        let legend_decimals = node.parse_int_child_or("LegendFieldDecimals", 2)?.max(0) as usize;

        // retention strategy: a time window wins over a sample count
        let expiration_period = node.parse_int_child_or("ExpirationPeriod", 0)?;
        let expiration_samples =
            node.parse_int_child_or("ExpirationSamples", DEFAULT_SAMPLE_CAPACITY)?;
        let make_buffer = || -> Box<dyn SampleBuffer> {
            if expiration_period > 0 {
                Box::new(ExpirationBuffer::from_millis(expiration_period as i64))
            } else {
                Box::new(CircularBuffer::new(expiration_samples.max(1) as usize))
            }
        };

        let fixed_range = match node.find_child("DefaultRangeAxis") {
            Ok(axis) => {
                if axis.parse_boolean_child_or("AutoRange", true) {
                    None
                } else {
                    let range = axis.find_child("AxisRange")?;
                    Some((
                        range.parse_float_child("Lower")?,
                        range.parse_float_child("Upper")?,
                    ))
                }
            }
            Err(_) => None,
        };

        let mut plottable: Vec<(String, bool)> = Vec::new();
        for binding in bindings {
            if *binding.dynamic_property() != DynamicProperty::Value {
                continue;
            }
            match binding {
                DataSourceBinding::Parameter(p) => {
                    plottable.push((p.ops_name.clone(), p.using_raw))
                }
                DataSourceBinding::Computation(_) => {
                    warn!("computation VALUE binding on a trend widget is not plottable")
                }
            }
        }

        let (w, h) = (opts.width, opts.height);
        let title_height = if title.is_empty() { 0.0 } else { TITLE_HEIGHT };
        let legend_height = if legend_enabled {
            LEGEND_ROW_HEIGHT * plottable.len() as f64
        } else {
            0.0
        };

        let background_id = scene.add(
            group,
            NodeKind::Rect { x: 0.0, y: 0.0, width: w, height: h },
        );
        scene.set_fill(background_id, graph_background);

        if !title.is_empty() {
            let style = TextStyle {
                bold: true,
                horizontal: HorizontalAlignment::Center,
                vertical: VerticalAlignment::Center,
                ..TextStyle::default()
            };
            write_text(scene, group, 0.0, 0.0, w, TITLE_HEIGHT, &style, &title);
        }

        let plot_x = MARGIN_LEFT;
        let plot_y = title_height + legend_height + 4.0;
        let plot_w = (w - MARGIN_LEFT - MARGIN_RIGHT).max(10.0);
        let plot_h = (h - plot_y - MARGIN_BOTTOM).max(10.0);
        let plot_id = scene.add(
            group,
            NodeKind::Rect { x: plot_x, y: plot_y, width: plot_w, height: plot_h },
        );
        scene.set_fill(plot_id, plot_background);
        scene.set_stroke(plot_id, Color::new(192, 192, 192, 255));
        scene.set_attr(plot_id, "stroke-width", "1");

        let mut series = Vec::new();
        for (i, (ops_name, using_raw)) in plottable.into_iter().enumerate() {
            let color = PLOT_COLORS[i % PLOT_COLORS.len()];

            let mut legend_value_id = None;
            let mut legend_background_id = None;
            if legend_enabled {
                let row_y = title_height + i as f64 * LEGEND_ROW_HEIGHT;
                let background = scene.add(
                    group,
                    NodeKind::Rect {
                        x: w - LEGEND_BOX_WIDTH,
                        y: row_y,
                        width: LEGEND_BOX_WIDTH,
                        height: LEGEND_ROW_HEIGHT,
                    },
                );
                scene.set_class(background, "dead-background");

                let marker = scene.add(
                    group,
                    NodeKind::Circle {
                        cx: w - LEGEND_BOX_WIDTH - 10.0,
                        cy: row_y + LEGEND_ROW_HEIGHT / 2.0,
                        r: 4.0,
                    },
                );
                scene.set_fill(marker, color);

                let name_style = TextStyle {
                    font_size: 10,
                    horizontal: HorizontalAlignment::Right,
                    vertical: VerticalAlignment::Center,
                    ..TextStyle::default()
                };
                write_text(
                    scene,
                    group,
                    0.0,
                    row_y,
                    w - LEGEND_BOX_WIDTH - 20.0,
                    LEGEND_ROW_HEIGHT,
                    &name_style,
                    &ops_name,
                );

                let value_style = TextStyle {
                    font_size: 10,
                    horizontal: HorizontalAlignment::Right,
                    vertical: VerticalAlignment::Center,
                    ..TextStyle::default()
                };
                let value_id = write_text(
                    scene,
                    group,
                    w - LEGEND_BOX_WIDTH,
                    row_y,
                    LEGEND_BOX_WIDTH - 2.0,
                    LEGEND_ROW_HEIGHT,
                    &value_style,
                    "",
                );
                scene.set_class(value_id, "dead-foreground");

                legend_value_id = Some(value_id);
                legend_background_id = Some(background);
            }

            let trace_id = scene.add(group, NodeKind::Path { segments: Vec::new() });
            scene.set_attr(trace_id, "fill", "none");
            scene.set_stroke(trace_id, color);
            scene.set_attr(trace_id, "stroke-width", "1");

            series.push(Series {
                ops_name,
                using_raw,
                buffer: make_buffer(),
                last: None,
                trace_id,
                legend_value_id,
                legend_background_id,
            });
        }

        Ok(Self {
            series,
            plot_x,
            plot_y,
            plot_w,
            plot_h,
            fixed_range,
            legend_decimals,
        })
    }

    pub(crate) fn on_value(&mut self, sample: &ParameterSample, _using_raw: bool) {
        for series in &mut self.series {
            if series.ops_name == sample.ops_name {
                series.last = Some(sample.clone());
            }
        }
    }

    pub(crate) fn digest(
        &mut self,
        _bounds: &Bounds,
        scene: &mut Scene,
    ) -> Result<(), WidgetError> {
        // fold pending samples into the buffers and refresh the legend
        for series in &mut self.series {
            let Some(sample) = series.last.take() else {
                continue;
            };
            let value = if sample.acquisition_status == AcquisitionStatus::Expired {
                None
            } else {
                sample.value(series.using_raw).as_f64()
            };
            series.buffer.push(Sample::new(sample.generation_time, value));

            if let (Some(value_id), Some(background_id)) =
                (series.legend_value_id, series.legend_background_id)
            {
                let text = match value {
                    Some(v) => format!("{:.*}", self.legend_decimals, v),
                    None => String::new(),
                };
                scene.set_text_content(value_id, text);
                let quality =
                    QualityState::of(sample.acquisition_status, sample.monitoring_result);
                scene.set_class(value_id, &quality.foreground_class());
                scene.set_class(background_id, &quality.background_class());
            }
        }

        // redraw every trace against the shared time domain
        let snapshots: Vec<Vec<Sample>> =
            self.series.iter().map(|s| s.buffer.snapshot()).collect();
        let all = snapshots.iter().flatten();

        let mut t_min: Option<DateTime<Utc>> = None;
        let mut t_max: Option<DateTime<Utc>> = None;
        let mut v_min = f64::INFINITY;
        let mut v_max = f64::NEG_INFINITY;
        for sample in all {
            t_min = Some(t_min.map_or(sample.time, |t| t.min(sample.time)));
            t_max = Some(t_max.map_or(sample.time, |t| t.max(sample.time)));
            if let Some(v) = sample.value {
                v_min = v_min.min(v);
                v_max = v_max.max(v);
            }
        }
        let (Some(t_min), Some(t_max)) = (t_min, t_max) else {
            return Ok(());
        };

        let (y_lo, y_hi) = match self.fixed_range {
            Some(range) => range,
            None if v_min.is_finite() => {
                if v_min == v_max {
                    (v_min - 1.0, v_max + 1.0)
                } else {
                    (v_min, v_max)
                }
            }
            None => (0.0, 1.0),
        };

        let span_ms = (t_max - t_min).num_milliseconds().max(1) as f64;
        let y_span = if y_hi > y_lo { y_hi - y_lo } else { 1.0 };
        for (series, snapshot) in self.series.iter().zip(snapshots) {
            let mut segments: Vec<Vec<(f64, f64)>> = Vec::new();
            let mut current: Vec<(f64, f64)> = Vec::new();
            for sample in snapshot {
                match sample.value {
                    Some(v) => {
                        let x = self.plot_x
                            + (sample.time - t_min).num_milliseconds() as f64 / span_ms
                                * self.plot_w;
                        let y = self.plot_y + self.plot_h
                            - ((v - y_lo) / y_span).clamp(0.0, 1.0) * self.plot_h;
                        current.push((x, y));
                    }
                    None => {
                        if !current.is_empty() {
                            segments.push(std::mem::take(&mut current));
                        }
                    }
                }
            }
            if !current.is_empty() {
                segments.push(current);
            }
            scene.set_segments(series.trace_id, segments);
        }

        Ok(())
    }

    #[cfg(test)]
    fn series_len(&self, index: usize) -> usize {
        self.series[index].buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use opsview_model::{parse_markup, MonitoringResult, Value};

    fn build() -> (Scene, LineGraph) {
        let xml = r#"
            <LineGraph>
                <X>0</X><Y>0</Y><Width>200</Width><Height>100</Height>
                <Title>Trend</Title>
                <ExpirationSamples>10</ExpirationSamples>
                <DataBindings>
                    <DataBinding>
                        <DynamicProperty>VALUE</DynamicProperty>
                        <DataSource class="ExternalDataSource">
                            <Names>
                                <entry><string>Opsname</string><string>SPEED</string></entry>
                            </Names>
                        </DataSource>
                    </DataBinding>
                </DataBindings>
            </LineGraph>"#;
        let doc = parse_markup(xml).unwrap();
        let node = doc.root();
        let opts = crate::widgets::parse_standard_options(node).unwrap();
        let bindings = crate::binding::parse_data_bindings(node);
        let mut scene = Scene::new(200.0, 100.0);
        let group = scene.add(scene.root(), NodeKind::Group);
        let graph = LineGraph::parse_and_draw(node, &opts, &bindings, &mut scene, group).unwrap();
        (scene, graph)
    }

    fn speed(v: f64, secs: i64) -> ParameterSample {
        ParameterSample {
            ops_name: "SPEED".into(),
            raw_value: Value::Float(v),
            eng_value: Value::Float(v),
            acquisition_status: AcquisitionStatus::Acquired,
            monitoring_result: Some(MonitoringResult::InLimits),
            generation_time: Utc.timestamp_opt(secs, 0).unwrap(),
        }
    }

    #[test]
    fn test_burst_coalesces_to_one_point_per_digest() {
        let (mut scene, mut graph) = build();
        for i in 0..5 {
            graph.on_value(&speed(i as f64, 100 + i), false);
        }
        let bounds = Bounds { width: 200.0, height: 100.0 };
        graph.digest(&bounds, &mut scene).unwrap();
        // five updates between digests keep only the last sample
        assert_eq!(graph.series_len(0), 1);

        graph.on_value(&speed(9.0, 110), false);
        graph.digest(&bounds, &mut scene).unwrap();
        assert_eq!(graph.series_len(0), 2);

        // digest without new data pushes nothing
        graph.digest(&bounds, &mut scene).unwrap();
        assert_eq!(graph.series_len(0), 2);
    }
}
