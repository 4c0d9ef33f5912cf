use kbdebugger_core::{
    AppViewModel, JobView, NoticeLevel, OversightView, ProgressBar, SelectAllState, WorkflowStep,
};

const BAR_WIDTH: usize = 20;

pub fn render(view: &AppViewModel) -> Vec<String> {
    let mut lines = Vec::new();

    let step = match view.step {
        WorkflowStep::Upload => "Upload",
        WorkflowStep::Oversight => "Oversight",
        WorkflowStep::TripletReview => "Triplet review",
    };
    lines.push(format!(
        "== {} | keyword: {} | document: {}",
        step,
        view.keyword.as_deref().unwrap_or("-"),
        view.document
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "-".to_string())
    ));

    if view.keyword.is_none() && !view.keywords.is_empty() {
        lines.push(format!("Keywords: {}", view.keywords.join(", ")));
    }
    if view.graph_loading {
        lines.push("Subgraph: loading...".to_string());
    } else if let Some(graph) = &view.graph {
        lines.push(format!(
            "Subgraph '{}': {} nodes, {} edges, {} sentences",
            graph.keyword, graph.nodes, graph.edges, graph.sentences
        ));
    }
    if let Some(context) = &view.run_context {
        lines.push(format!(
            "Source: {} ({})",
            if context.source_name.is_empty() {
                &context.source
            } else {
                &context.source_name
            },
            context.keyword
        ));
    }
    if let Some(job) = &view.job {
        lines.push(job_line(job));
    }

    match view.step {
        WorkflowStep::Upload => {}
        WorkflowStep::Oversight => render_oversight(&view.oversight, &mut lines),
        WorkflowStep::TripletReview => {
            lines.push(format!(
                "Triplets: {} of {} will be submitted",
                view.active_triplets,
                view.triplets.len()
            ));
            for (index, row) in view.triplets.iter().enumerate() {
                let marker = if row.deleted { "x" } else { " " };
                lines.push(format!(
                    "{:>3}. [{}] ({} | {} | {})  {}",
                    index + 1,
                    marker,
                    row.subject,
                    row.predicate,
                    row.object,
                    row.sentence
                ));
            }
        }
    }

    if let Some(node) = &view.node_details {
        lines.push(format!("Node '{}':", node.name));
        lines.extend(node.details.iter().map(|detail| format!("  - {detail}")));
    }
    if view.legacy_upload_verify {
        if let Some(panes) = &view.verify {
            lines.push(format!("Existing: {}", panes.existing));
            lines.push(format!("Partially new: {}", panes.partial));
            lines.push(format!("New: {}", panes.new));
        }
    }
    if let Some(notice) = &view.notice {
        let prefix = match notice.level {
            NoticeLevel::Info => "info",
            NoticeLevel::Error => "error",
        };
        lines.push(format!("[{prefix}] {}", notice.text));
    }

    lines
}

fn job_line(job: &JobView) -> String {
    let mut line = format!("Job: {}", job.kind.label());
    if let Some(id) = &job.job_id {
        line.push_str(&format!(" #{id}"));
    }
    line.push_str(&format!(" {}", progress_text(job.progress.bar)));
    if !job.progress.stage.is_empty() {
        line.push_str(&format!(" {}", job.progress.stage));
    }
    if !job.progress.message.is_empty() {
        line.push_str(&format!(": {}", job.progress.message));
    }
    line
}

pub fn progress_text(bar: ProgressBar) -> String {
    match bar {
        ProgressBar::Determinate { percent } => {
            let filled = usize::from(percent.min(100)) * BAR_WIDTH / 100;
            format!(
                "[{}{}] {:>3}%",
                "#".repeat(filled),
                "-".repeat(BAR_WIDTH - filled),
                percent
            )
        }
        ProgressBar::Indeterminate => format!("[{}] ...", "~".repeat(BAR_WIDTH)),
    }
}

fn render_oversight(oversight: &OversightView, lines: &mut Vec<String>) {
    let tabs: Vec<String> = oversight
        .tabs
        .iter()
        .map(|tab| {
            if tab.active {
                format!("*{} ({})*", tab.decision, tab.count)
            } else {
                format!("{} ({})", tab.decision, tab.count)
            }
        })
        .collect();
    lines.push(tabs.join(" | "));

    let select_all = match oversight.select_all {
        SelectAllState::Checked => "all",
        SelectAllState::Unchecked => "none",
        SelectAllState::Indeterminate => "some",
    };
    lines.push(format!(
        "Page {}/{} | on page: {} | selected: {}",
        oversight.page, oversight.page_count, select_all, oversight.selected_count
    ));
    for (index, row) in oversight.rows.iter().enumerate() {
        lines.push(format!(
            "{:>3}. [{}] {:.2} {}",
            index + 1,
            if row.checked { "x" } else { " " },
            row.max_score,
            row.quality
        ));
        if let Some(neighbor) = &row.matched_neighbor {
            lines.push(format!("       neighbor: {neighbor}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kbdebugger_core::{
        Decision, JobKind, JobProgressView, Notice, OversightRowView, SelectionKey, TabView,
    };

    #[test]
    fn progress_text_fills_proportionally() {
        assert_eq!(
            progress_text(ProgressBar::Determinate { percent: 50 }),
            format!("[{}{}]  50%", "#".repeat(10), "-".repeat(10))
        );
        assert_eq!(
            progress_text(ProgressBar::Determinate { percent: 100 }),
            format!("[{}] 100%", "#".repeat(20))
        );
        assert!(progress_text(ProgressBar::Indeterminate).ends_with("..."));
    }

    #[test]
    fn upload_step_shows_job_and_notice() {
        let view = AppViewModel {
            keyword: Some("Transparency".to_string()),
            job: Some(JobView {
                kind: JobKind::Pipeline,
                job_id: Some("j1".to_string()),
                progress: JobProgressView {
                    stage: "NoveltyLLM".to_string(),
                    message: "Comparing".to_string(),
                    bar: ProgressBar::Indeterminate,
                },
            }),
            notice: Some(Notice {
                level: NoticeLevel::Error,
                text: "No document uploaded".to_string(),
            }),
            ..AppViewModel::default()
        };

        let lines = render(&view);
        assert!(lines[0].contains("keyword: Transparency"));
        assert!(lines
            .iter()
            .any(|l| l.starts_with("Job: pipeline #j1") && l.ends_with("NoveltyLLM: Comparing")));
        assert_eq!(lines.last().unwrap(), "[error] No document uploaded");
    }

    #[test]
    fn oversight_marks_active_tab_and_checked_rows() {
        let mut view = AppViewModel {
            step: WorkflowStep::Oversight,
            ..AppViewModel::default()
        };
        view.oversight = OversightView {
            tabs: Decision::ALL
                .iter()
                .map(|&decision| TabView {
                    decision,
                    count: usize::from(decision == Decision::New),
                    active: decision == Decision::New,
                })
                .collect(),
            page: 1,
            page_count: 1,
            rows: vec![OversightRowView {
                key: SelectionKey("NEW::q::n".to_string()),
                quality: "Humans oversee AI.".to_string(),
                decision: Decision::New,
                max_score: 0.25,
                confidence: Some(0.9),
                matched_neighbor: Some("n".to_string()),
                rationale: String::new(),
                checked: true,
            }],
            select_all: SelectAllState::Checked,
            selected_count: 1,
        };

        let lines = render(&view);
        assert!(lines.contains(&"EXISTING (0) | PARTIALLY_NEW (0) | *NEW (1)*".to_string()));
        assert!(lines.contains(&"Page 1/1 | on page: all | selected: 1".to_string()));
        assert!(lines.contains(&"  1. [x] 0.25 Humans oversee AI.".to_string()));
    }

    #[test]
    fn verify_panes_hidden_without_legacy_option() {
        let view = AppViewModel {
            verify: Some(Default::default()),
            ..AppViewModel::default()
        };
        assert!(!render(&view).iter().any(|l| l.starts_with("Existing:")));
    }
}
