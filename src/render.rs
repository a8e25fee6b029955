//! Plain-text views of the document: the month grid, task cards and the
//! weekly plan.

use std::collections::HashSet;
use std::fmt::Write;

use chrono::NaiveDate;

use crate::core::calendar::{DAYS_OF_WEEK, YearMonth, build_grid};
use crate::core::plan::{WeeklyPlan, day_name};
use crate::core::task::Task;

const CELL_WIDTH: usize = 5;

pub fn format_minutes(minutes: u32) -> String {
    match (minutes / 60, minutes % 60) {
        (0, m) => format!("{}m", m),
        (h, 0) => format!("{}h", h),
        (h, m) => format!("{}h {}m", h, m),
    }
}

/// Sunday-first month grid. Filler days are parenthesized, today is starred
/// and days with planned work are dotted.
pub fn month_grid(ym: YearMonth, busy_days: &HashSet<NaiveDate>, today: NaiveDate) -> String {
    let mut out = String::new();
    let width = CELL_WIDTH * 7;
    let _ = writeln!(out, "{:^width$}", ym.to_string(), width = width);

    for name in DAYS_OF_WEEK {
        let _ = write!(out, "{:>width$}", &name[..2], width = CELL_WIDTH);
    }
    out.push('\n');

    let grid = build_grid(ym.year(), ym.month() as i32);
    for week in grid.chunks(7) {
        for day in week {
            let cell = if !day.is_current_month() {
                format!("({})", day.day_of_month)
            } else {
                let mark = if day.date == today {
                    '*'
                } else if busy_days.contains(&day.date) {
                    '·'
                } else {
                    ' '
                };
                format!("{}{}", day.day_of_month, mark)
            };
            let _ = write!(out, "{:>width$}", cell, width = CELL_WIDTH);
        }
        out.push('\n');
    }

    out
}

pub fn task_card(task: &Task) -> String {
    let mut out = String::new();
    let check = if task.completed { "[x]" } else { "[ ]" };
    let _ = writeln!(
        out,
        "{} {}  ({} · {} {})",
        check,
        task.title,
        task.priority.label(),
        task.category,
        task.color_hex()
    );

    let short_id: String = task.id.to_string().chars().take(8).collect();
    let mut meta = vec![format!("id {}", short_id)];
    if !task.estimated_time.is_empty() {
        meta.push(format!("est {}", task.estimated_time));
    }
    if let Some(deadline) = &task.deadline {
        meta.push(format!("due {}", deadline));
    }
    let _ = writeln!(out, "    {}", meta.join(" · "));

    if let Some(description) = task.description.as_deref().filter(|d| !d.is_empty()) {
        let _ = writeln!(out, "    {}", description);
    }
    if !task.tags.is_empty() {
        let tags: Vec<String> = task.tags.iter().map(|t| format!("#{}", t)).collect();
        let _ = writeln!(out, "    {}", tags.join(" "));
    }

    out
}

/// All task cards, open tasks first, followed by a one-line summary.
pub fn task_list(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return "No tasks yet.\n".to_string();
    }

    let mut ordered: Vec<&Task> = tasks.iter().collect();
    ordered.sort_by_key(|t| (t.completed, t.priority));

    let mut out = String::new();
    for task in &ordered {
        out.push_str(&task_card(task));
    }

    let done = tasks.iter().filter(|t| t.completed).count();
    let open_minutes: u32 = tasks
        .iter()
        .filter(|t| !t.completed)
        .filter_map(Task::estimated_minutes)
        .sum();
    let _ = writeln!(
        out,
        "\n{} tasks, {} done, ~{} of open work",
        tasks.len(),
        done,
        format_minutes(open_minutes)
    );
    out
}

pub fn weekly_plan(plan: &WeeklyPlan) -> String {
    let mut out = String::new();
    for (day, entries) in plan.iter() {
        let _ = writeln!(out, "{}", day_name(day));
        if entries.is_empty() {
            out.push_str("  (nothing planned)\n");
            continue;
        }
        for entry in entries {
            let check = if entry.completed { "[x]" } else { "[ ]" };
            let span = if entry.start == entry.end || entry.end.is_empty() {
                entry.start.clone()
            } else {
                format!("{} → {}", entry.start, entry.end)
            };
            let _ = writeln!(out, "  {} {}  {}", check, entry.task, span);
            if let Some(notes) = entry.notes.as_deref().filter(|n| !n.is_empty()) {
                let _ = writeln!(out, "      {}", notes);
            }
        }
    }
    out
}
