//! HTML dashboard generator with Chart.js

use crate::error::Result;
use bench_display_core::{format_value, short_id, Aggregate, ChartSeries, Dashboard, ViewOptions};
use chrono::Utc;
use minijinja::{context, Environment};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// HTML template for the benchmark dashboard
const DASHBOARD_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{{ title }}</title>
    <script src="https://cdn.jsdelivr.net/npm/chart.js@4.4.1/dist/chart.umd.min.js"></script>
    <style>
        :root {
            --bg-primary: #0d1117;
            --bg-secondary: #161b22;
            --bg-tertiary: #21262d;
            --text-primary: #c9d1d9;
            --text-secondary: #8b949e;
            --text-muted: #6e7681;
            --border-color: #30363d;
            --accent-blue: #58a6ff;
            --accent-purple: #a371f7;
        }

        * {
            margin: 0;
            padding: 0;
            box-sizing: border-box;
        }

        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', 'Noto Sans', Helvetica, Arial, sans-serif;
            background: var(--bg-primary);
            color: var(--text-primary);
            line-height: 1.6;
            min-height: 100vh;
        }

        .container {
            max-width: 1600px;
            margin: 0 auto;
            padding: 2rem;
        }

        header {
            text-align: center;
            margin-bottom: 2rem;
            padding: 2rem;
            background: linear-gradient(135deg, var(--bg-secondary) 0%, var(--bg-tertiary) 100%);
            border-radius: 16px;
            border: 1px solid var(--border-color);
        }

        h1 {
            font-size: 2.25rem;
            font-weight: 600;
            color: var(--accent-blue);
            margin-bottom: 0.5rem;
        }

        .subtitle {
            color: var(--text-secondary);
            font-size: 1.1rem;
        }

        .subtitle code {
            color: var(--accent-purple);
        }

        .last-updated {
            color: var(--text-muted);
            font-size: 0.9rem;
            margin-top: 1rem;
        }

        .chart-grid {
            display: grid;
            grid-template-columns: repeat(auto-fill, minmax(420px, 1fr));
            gap: 1.5rem;
        }

        .chart-card {
            background: var(--bg-secondary);
            border: 1px solid var(--border-color);
            border-radius: 12px;
            overflow: hidden;
        }

        .chart-card h2 {
            font-size: 0.95rem;
            font-weight: 600;
            padding: 0.75rem 1rem;
            background: var(--bg-tertiary);
            border-bottom: 1px solid var(--border-color);
            font-family: 'SF Mono', 'Fira Code', monospace;
            white-space: nowrap;
            overflow: hidden;
            text-overflow: ellipsis;
        }

        .chart-container {
            padding: 1rem;
            height: 300px;
            position: relative;
        }

        .chart-stats {
            display: flex;
            gap: 1rem;
            padding: 0 1rem 1rem;
            font-size: 0.85rem;
            color: var(--text-secondary);
        }

        .stat-value {
            font-weight: 600;
            color: var(--accent-blue);
        }

        .info {
            text-align: center;
            padding: 3rem;
            color: var(--text-muted);
            background: var(--bg-secondary);
            border: 1px solid var(--border-color);
            border-radius: 12px;
        }

        footer {
            text-align: center;
            padding: 2rem;
            color: var(--text-muted);
            font-size: 0.9rem;
        }

        @media (max-width: 768px) {
            .container {
                padding: 1rem;
            }

            .chart-grid {
                grid-template-columns: 1fr;
            }
        }
    </style>
</head>
<body>
    <div class="container">
        <header>
            <h1>{{ title }}</h1>
            <p class="subtitle">
                {{ owner }}/{{ repository }}{% if branch %} on {{ branch }}{% endif %} at <code>{{ commit_short }}</code>
                &middot; {{ artifact_count }} of {{ commit_count }} commits with data
            </p>
            <p class="last-updated">Generated: {{ generated_at }}</p>
        </header>

        {% if notice %}
            <p class="info">{{ notice }}</p>
        {% else %}
            <div class="chart-grid">
            {% for chart in charts %}
                <div class="chart-card">
                    <h2 title="{{ chart.name }}">{{ chart.name }}</h2>
                    <div class="chart-container">
                        <canvas id="chart-{{ loop.index0 }}"></canvas>
                    </div>
                    <div class="chart-stats">
                        <span>latest <span class="stat-value">{{ chart.newest }}</span>{% if chart.newest_commit %} @ {{ chart.newest_commit }}{% endif %}</span>
                        <span>min <span class="stat-value">{{ chart.min }}</span></span>
                        <span>max <span class="stat-value">{{ chart.max }}</span></span>
                        <span><span class="stat-value">{{ chart.point_count }}</span> points</span>
                    </div>
                </div>
            {% endfor %}
            </div>
        {% endif %}

        <footer>
            <p>Generated by bench-display</p>
        </footer>
    </div>

    <script>
        window.BENCHMARK_CHARTS = {{ charts_json | safe }};

        function formatValue(value) {
            if (value === 0) return '0';
            const abs = Math.abs(value);
            if (abs < 1e-9) return (value * 1e12).toFixed(2) + ' ps';
            if (abs < 1e-6) return (value * 1e9).toFixed(2) + ' ns';
            if (abs < 1e-3) return (value * 1e6).toFixed(2) + ' µs';
            if (abs < 1) return (value * 1e3).toFixed(2) + ' ms';
            return value.toFixed(2) + ' s';
        }

        document.addEventListener('DOMContentLoaded', function() {
            window.BENCHMARK_CHARTS.forEach((series, index) => {
                const canvas = document.getElementById('chart-' + index);
                if (!canvas) return;

                new Chart(canvas, {
                    type: 'line',
                    data: {
                        labels: series.points.map(p => p.label),
                        datasets: [{
                            label: series.name,
                            data: series.points.map(p => p.value),
                            borderColor: '#8884d8',
                            backgroundColor: '#8884d820',
                            borderWidth: 1.5,
                            pointRadius: 0,
                            tension: 0.3,
                            fill: false
                        }]
                    },
                    options: {
                        responsive: true,
                        maintainAspectRatio: false,
                        interaction: {
                            mode: 'index',
                            intersect: false
                        },
                        plugins: {
                            legend: { display: false },
                            tooltip: {
                                backgroundColor: '#21262d',
                                titleColor: '#c9d1d9',
                                bodyColor: '#8b949e',
                                borderColor: '#30363d',
                                borderWidth: 1,
                                callbacks: {
                                    title: function(context) {
                                        return 'Commit: ' + series.points[context[0].dataIndex].commit;
                                    },
                                    label: function(context) {
                                        return 'Value: ' + formatValue(context.parsed.y);
                                    }
                                }
                            }
                        },
                        scales: {
                            x: {
                                grid: { color: '#30363d' },
                                ticks: {
                                    color: '#8b949e',
                                    autoSkip: false,
                                    maxRotation: 45,
                                    minRotation: 45,
                                    font: { size: 12 }
                                }
                            },
                            y: {
                                beginAtZero: false,
                                grid: { color: '#30363d' },
                                ticks: {
                                    color: '#8b949e',
                                    maxTicksLimit: 5,
                                    callback: formatValue
                                }
                            }
                        }
                    }
                });
            });
        });
    </script>
</body>
</html>
"#;

/// Dashboard configuration
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Title for the dashboard
    pub title: String,
    /// Directory receiving `index.html` and `data.json`
    pub output_dir: PathBuf,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            title: "Micro-Benchmark".to_string(),
            output_dir: PathBuf::from("bench-display"),
        }
    }
}

/// A loaded query ready to be rendered
#[derive(Debug, Clone)]
pub struct DashboardView<'a> {
    pub owner: &'a str,
    pub branch: Option<&'a str>,
    /// The selected commit the range ends at
    pub commit: &'a str,
    pub aggregate: &'a Aggregate,
    pub options: ViewOptions,
}

impl<'a> DashboardView<'a> {
    /// View of a dashboard that has finished loading a query
    pub fn from_dashboard(dashboard: &'a Dashboard) -> Option<Self> {
        let selection = dashboard.selection();
        Some(Self {
            owner: selection.owner.as_deref()?,
            branch: selection.branch.as_deref(),
            commit: selection.commit.as_deref()?,
            aggregate: dashboard.aggregate()?,
            options: *dashboard.options(),
        })
    }
}

/// Per-chart data for template rendering
#[derive(Debug, Clone, Serialize)]
struct ChartCard {
    name: String,
    point_count: usize,
    newest: String,
    newest_commit: Option<String>,
    min: String,
    max: String,
}

impl ChartCard {
    fn from_series(series: &ChartSeries) -> Self {
        let values = series.points.iter().map(|p| p.value);
        let min = values.clone().fold(f64::INFINITY, f64::min);
        let max = values.fold(f64::NEG_INFINITY, f64::max);
        let newest = series.newest();

        let or_dash = |v: f64| {
            if series.is_empty() {
                "-".to_string()
            } else {
                format_value(v)
            }
        };

        Self {
            name: series.name.clone(),
            point_count: series.points.len(),
            newest: newest.map(|p| format_value(p.value)).unwrap_or_else(|| "-".to_string()),
            newest_commit: newest.map(|p| p.label.clone()),
            min: or_dash(min),
            max: or_dash(max),
        }
    }
}

/// Generate the HTML dashboard
pub fn render_dashboard(view: &DashboardView<'_>, config: &DashboardConfig) -> Result<String> {
    let mut env = Environment::new();
    env.add_template("dashboard.html", DASHBOARD_TEMPLATE)?;
    let template = env.get_template("dashboard.html")?;

    let charts = view.aggregate.charts(&view.options);
    let cards: Vec<ChartCard> = charts.iter().map(ChartCard::from_series).collect();
    let notice = view
        .aggregate
        .empty_state(&view.options)
        .map(|state| state.message());

    // Keep a "</script>" inside a benchmark name from closing the tag
    let charts_json = serde_json::to_string(&charts)?.replace("</", "<\\/");

    let html = template.render(context! {
        title => &config.title,
        owner => view.owner,
        repository => &view.aggregate.repository,
        branch => view.branch,
        commit_short => short_id(view.commit),
        commit_count => view.aggregate.commits.len(),
        artifact_count => view.aggregate.table.len(),
        generated_at => Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        notice => notice,
        charts => cards,
        charts_json => charts_json,
    })?;

    Ok(html)
}

/// Write `index.html` and the raw aggregate as `data.json`.
///
/// Returns the path of the written page.
pub fn write_dashboard(view: &DashboardView<'_>, config: &DashboardConfig) -> Result<PathBuf> {
    let output_dir: &Path = &config.output_dir;
    std::fs::create_dir_all(output_dir)?;

    let html = render_dashboard(view, config)?;
    let index_path = output_dir.join("index.html");
    std::fs::write(&index_path, html)?;

    let data_path = output_dir.join("data.json");
    let json = serde_json::to_string_pretty(view.aggregate)?;
    std::fs::write(&data_path, json)?;

    Ok(index_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bench_display_core::{BenchmarkDocument, BenchmarkMeasurement, BenchmarkTable};

    fn aggregate() -> Aggregate {
        let mut doc = BenchmarkDocument::new();
        doc.insert(
            "prove<keccak>".to_string(),
            BenchmarkMeasurement::from_median(0.0025),
        );
        let mut table = BenchmarkTable::new();
        table.insert("abcdef0123456789", doc);
        Aggregate::new(
            "widgets",
            vec!["abcdef0123456789".to_string(), "0000000000".to_string()],
            table,
        )
    }

    fn view(aggregate: &Aggregate) -> DashboardView<'_> {
        DashboardView {
            owner: "acme",
            branch: Some("main"),
            commit: "abcdef0123456789",
            aggregate,
            options: ViewOptions::default(),
        }
    }

    #[test]
    fn test_render_dashboard_with_data() {
        let agg = aggregate();
        let config = DashboardConfig {
            title: "Test Dashboard".to_string(),
            ..Default::default()
        };

        let html = render_dashboard(&view(&agg), &config).unwrap();
        assert!(html.contains("Test Dashboard"));
        assert!(html.contains("acme/widgets"));
        assert!(html.contains("abcdef0"));
        assert!(html.contains("2.50 ms"));
        assert!(html.contains("1 of 2 commits"));
        assert!(html.contains("chart-0"));
        // Names are escaped in markup
        assert!(html.contains("prove&lt;keccak&gt;"));
    }

    #[test]
    fn test_render_dashboard_empty() {
        let agg = Aggregate::new("widgets", vec!["abc".to_string()], BenchmarkTable::new());
        let html = render_dashboard(&view(&agg), &DashboardConfig::default()).unwrap();

        assert!(html.contains("No benchmark data available. The CI might still be running."));
        assert!(!html.contains("class=\"chart-card\""));
    }

    #[test]
    fn test_script_tag_in_name_is_neutralized() {
        let mut doc = BenchmarkDocument::new();
        doc.insert(
            "</script><b>".to_string(),
            BenchmarkMeasurement::from_median(1.0),
        );
        let mut table = BenchmarkTable::new();
        table.insert("c1", doc);
        let agg = Aggregate::new("widgets", vec!["c1".to_string()], table);

        let html = render_dashboard(&view(&agg), &DashboardConfig::default()).unwrap();
        assert_eq!(html.matches("</script>").count(), 2);
    }

    #[test]
    fn test_write_dashboard() {
        let dir = tempfile::tempdir().unwrap();
        let agg = aggregate();
        let config = DashboardConfig {
            output_dir: dir.path().join("out"),
            ..Default::default()
        };

        let index = write_dashboard(&view(&agg), &config).unwrap();
        assert!(index.exists());

        let data = std::fs::read_to_string(dir.path().join("out").join("data.json")).unwrap();
        let parsed: Aggregate = serde_json::from_str(&data).unwrap();
        assert_eq!(parsed, agg);
    }

    #[test]
    fn test_view_requires_loaded_query() {
        let dashboard = Dashboard::new();
        assert!(DashboardView::from_dashboard(&dashboard).is_none());
    }
}
