//! Handlers for every shell command, plus argument parsing and text rendering.

use std::{fmt::Write as _, fs, path::PathBuf};

use chrono::{Duration, NaiveDate};

use crate::{
    core::{
        errors::SavingsError,
        services::{PlanService, SavingsPlan, SavingsService},
    },
    currency::{format_currency_value, format_number, RateError},
    ledger::{Amount, YearMonth},
};

use super::{
    registry::{CommandEntry, CommandRegistry},
    shell_context::{CommandError, CommandResult, ShellContext},
};

const DATE_FORMAT: &str = "%Y-%m-%d";
const PLAN_PREVIEW_ROWS: usize = 7;

pub fn register_all(registry: &mut CommandRegistry) {
    registry.register(
        CommandEntry::new(
            "status",
            "Show target, total saved, remaining, and today's deposit",
            "status",
            cmd_status,
        )
        .with_aliases(&["start"]),
    );
    registry.register(CommandEntry::new(
        "add",
        "Record a deposit for today or a given date",
        "add [amount] | add <YYYY-MM-DD> <amount>",
        cmd_add,
    ));
    registry.register(CommandEntry::new(
        "correct",
        "Overwrite the amount recorded for a date",
        "correct <YYYY-MM-DD> <amount>",
        cmd_correct,
    ));
    registry.register(CommandEntry::new(
        "set-target",
        "Replace the savings target",
        "set-target <amount>",
        cmd_set_target,
    ));
    registry.register(CommandEntry::new(
        "set-start",
        "Replace the plan start date",
        "set-start <YYYY-MM-DD>",
        cmd_set_start,
    ));
    registry.register(CommandEntry::new(
        "set-rate",
        "Store a fallback exchange rate used when online sources fail",
        "set-rate <rate>",
        cmd_set_rate,
    ));
    registry.register(CommandEntry::new(
        "total",
        "Show the total saved",
        "total",
        cmd_total,
    ));
    registry.register(CommandEntry::new(
        "remaining",
        "Show the remaining amount and the recommended daily deposit",
        "remaining",
        cmd_remaining,
    ));
    registry.register(CommandEntry::new(
        "rate",
        "Show the exchange rate and converted totals",
        "rate",
        cmd_rate,
    ));
    registry.register(CommandEntry::new(
        "report",
        "List deposits for a month",
        "report [YYYY-MM]",
        cmd_report,
    ));
    registry.register(CommandEntry::new(
        "plan",
        "Show or export the day-by-day savings plan",
        "plan [horizon_days] | plan export <path> [horizon_days]",
        cmd_plan,
    ));
    registry.register(CommandEntry::new(
        "backups",
        "List rotated ledger backups",
        "backups",
        cmd_backups,
    ));
    registry.register(CommandEntry::new(
        "help",
        "List commands or describe one",
        "help [command]",
        cmd_help,
    ));
    registry.register(
        CommandEntry::new("exit", "Leave the shell", "exit", cmd_exit).with_aliases(&["quit"]),
    );
}

pub(crate) fn parse_amount(raw: &str) -> Result<Amount, CommandError> {
    let cleaned: String = raw.trim().chars().filter(|c| !matches!(c, ',' | '_')).collect();
    cleaned.parse::<Amount>().map_err(|_| {
        CommandError::InvalidArguments(format!(
            "`{}` is not a valid amount; use a whole non-negative number",
            raw
        ))
    })
}

pub(crate) fn parse_date(raw: &str, today: NaiveDate) -> Result<NaiveDate, CommandError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "today" => return Ok(today),
        "yesterday" => return Ok(today - Duration::days(1)),
        _ => {}
    }
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| {
        CommandError::InvalidArguments(format!("`{}` is not a date; use YYYY-MM-DD", raw))
    })
}

pub(crate) fn parse_rate(raw: &str) -> Result<f64, CommandError> {
    raw.trim().replace(',', "").parse::<f64>().map_err(|_| {
        CommandError::InvalidArguments(format!("`{}` is not a valid exchange rate", raw))
    })
}

fn parse_horizon(raw: &str, max_days: u32) -> Result<u32, CommandError> {
    raw.trim()
        .parse::<u32>()
        .ok()
        .filter(|days| (1..=max_days).contains(days))
        .ok_or_else(|| {
            CommandError::InvalidArguments(format!(
                "`{}` is not a valid horizon; use 1 to {} days",
                raw, max_days
            ))
        })
}

fn expect_no_args(args: &[&str]) -> Result<(), CommandError> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(CommandError::InvalidArguments(format!(
            "unexpected arguments: {}",
            args.join(" ")
        )))
    }
}

fn cmd_status(ctx: &mut ShellContext, args: &[&str]) -> CommandResult {
    expect_no_args(args)?;
    let status = SavingsService::status(ctx.store().snapshot(), ctx.today());
    let mut out = String::new();
    let _ = writeln!(out, "Target:    {}", ctx.money(status.target));
    let _ = writeln!(out, "Saved:     {}", ctx.money(status.total));
    let _ = writeln!(out, "Remaining: {}", ctx.money(status.remaining));
    let _ = writeln!(out, "Today:     {}", ctx.money(status.today_saved));
    let started = status
        .start_date
        .map(|date| date.format(DATE_FORMAT).to_string())
        .unwrap_or_else(|| "not started".into());
    let _ = write!(out, "Started:   {}", started);
    if status.is_complete() {
        let _ = write!(out, "\nTarget reached.");
    }
    Ok(out)
}

fn cmd_add(ctx: &mut ShellContext, args: &[&str]) -> CommandResult {
    let today = ctx.today();
    let (date, amount) = match args {
        [] => (today, ctx.config.default_deposit),
        [amount] => (today, parse_amount(amount)?),
        [date, amount] => (parse_date(date, today)?, parse_amount(amount)?),
        _ => {
            return Err(CommandError::InvalidArguments(
                "too many arguments for `add`".into(),
            ))
        }
    };
    let day_total = ctx.store_mut().record_deposit(date, amount)?;
    let ledger = ctx.store().snapshot();
    tracing::info!(%date, amount, day_total, "deposit recorded");
    Ok(format!(
        "Recorded {} on {} (day total {}).\nSaved: {}  Remaining: {}",
        ctx.money(amount),
        date.format(DATE_FORMAT),
        ctx.money(day_total),
        ctx.money(ledger.total_saved()),
        ctx.money(ledger.remaining())
    ))
}

fn cmd_correct(ctx: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [date, amount] = args else {
        return Err(CommandError::InvalidArguments(
            "`correct` needs a date and an amount".into(),
        ));
    };
    let date = parse_date(date, ctx.today())?;
    let amount = parse_amount(amount)?;
    ctx.store_mut().set_entry_exact(date, amount)?;
    tracing::info!(%date, amount, "entry corrected");
    Ok(format!(
        "Entry for {} set to {}. Saved: {}",
        date.format(DATE_FORMAT),
        ctx.money(amount),
        ctx.money(ctx.store().total_saved())
    ))
}

fn cmd_set_target(ctx: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [amount] = args else {
        return Err(CommandError::InvalidArguments(
            "`set-target` needs one amount".into(),
        ));
    };
    let amount = parse_amount(amount)?;
    ctx.store_mut().set_target(amount)?;
    Ok(format!(
        "Target set to {}. Remaining: {}",
        ctx.money(amount),
        ctx.money(ctx.store().snapshot().remaining())
    ))
}

fn cmd_set_start(ctx: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [date] = args else {
        return Err(CommandError::InvalidArguments(
            "`set-start` needs one date".into(),
        ));
    };
    let date = parse_date(date, ctx.today())?;
    ctx.store_mut().set_start_date(date)?;
    Ok(format!("Start date set to {}.", date.format(DATE_FORMAT)))
}

fn cmd_set_rate(ctx: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [rate] = args else {
        return Err(CommandError::InvalidArguments(
            "`set-rate` needs one rate".into(),
        ));
    };
    let rate = parse_rate(rate)?;
    ctx.store_mut().set_local_rate(rate)?;
    Ok(format!(
        "Fallback rate set: 1 {} = {} {}",
        ctx.rates().base(),
        format_number(rate, 2),
        ctx.rates().quote()
    ))
}

fn cmd_total(ctx: &mut ShellContext, args: &[&str]) -> CommandResult {
    expect_no_args(args)?;
    Ok(format!("Saved: {}", ctx.money(ctx.store().total_saved())))
}

fn cmd_remaining(ctx: &mut ShellContext, args: &[&str]) -> CommandResult {
    expect_no_args(args)?;
    let recommendation = SavingsService::daily_recommendation(
        ctx.store().snapshot(),
        ctx.today(),
        ctx.config.plan_horizon_days,
    );
    if recommendation.remaining == 0 {
        return Ok(format!("Remaining: {}. Target reached.", ctx.money(0)));
    }
    Ok(format!(
        "Remaining: {}\nRecommended: {} per working day over {} working days (until {})",
        ctx.money(recommendation.remaining),
        ctx.money(recommendation.daily_amount),
        recommendation.working_days,
        recommendation.horizon_end.format(DATE_FORMAT)
    ))
}

fn cmd_rate(ctx: &mut ShellContext, args: &[&str]) -> CommandResult {
    expect_no_args(args)?;
    let ledger = ctx.store().snapshot();
    match ctx.rates().get_rate(ledger.settings.local_rate) {
        Ok(quote) => Ok(format!(
            "{}\nSaved:     {} = {}\nRemaining: {} = {}",
            quote.disclosure(),
            ctx.money(ledger.total_saved()),
            format_currency_value(quote.convert(ledger.total_saved()), &quote.quote, 0),
            ctx.money(ledger.remaining()),
            format_currency_value(quote.convert(ledger.remaining()), &quote.quote, 0),
        )),
        Err(RateError::Unavailable) => Ok(format!(
            "Exchange rate {} -> {} is unavailable right now. Use `set-rate <rate>` to store a fallback.",
            ctx.rates().base(),
            ctx.rates().quote()
        )),
        Err(err) => Ok(format!("Exchange rate unavailable: {}", err)),
    }
}

fn cmd_report(ctx: &mut ShellContext, args: &[&str]) -> CommandResult {
    let month = match args {
        [] => YearMonth::containing(ctx.today()),
        [raw] => raw.parse::<YearMonth>()?,
        _ => {
            return Err(CommandError::InvalidArguments(
                "`report` takes at most one month".into(),
            ))
        }
    };
    let report = SavingsService::monthly_report(ctx.store().snapshot(), month);
    if report.is_empty() {
        return Ok(format!("No deposits in {}. Total: {}", month, ctx.money(0)));
    }
    let mut out = format!("Deposits in {}\n", month);
    for (date, amount) in &report.entries {
        let _ = writeln!(out, "  {}  {:>14}", date.format(DATE_FORMAT), ctx.money(*amount));
    }
    let _ = write!(out, "Total: {}", ctx.money(report.total));
    Ok(out)
}

fn cmd_plan(ctx: &mut ShellContext, args: &[&str]) -> CommandResult {
    let default_horizon = ctx.config.plan_horizon_days;
    let max_horizon = ctx.config.max_plan_horizon_days;
    match args {
        [] => render_plan(ctx, default_horizon),
        ["export", path] => export_plan(ctx, PathBuf::from(*path), default_horizon),
        ["export", path, horizon] => {
            export_plan(ctx, PathBuf::from(*path), parse_horizon(horizon, max_horizon)?)
        }
        [horizon] => render_plan(ctx, parse_horizon(horizon, max_horizon)?),
        _ => Err(CommandError::InvalidArguments(
            "unrecognised arguments for `plan`".into(),
        )),
    }
}

fn render_plan(ctx: &ShellContext, horizon: u32) -> CommandResult {
    let plan = PlanService::generate(ctx.store().snapshot(), None, horizon)?;
    let today = ctx.today();
    let mut out = plan_summary(ctx, &plan);
    let upcoming: Vec<_> = plan
        .rows
        .iter()
        .filter(|row| row.date >= today)
        .take(PLAN_PREVIEW_ROWS)
        .collect();
    if upcoming.is_empty() {
        return Ok(out);
    }
    let _ = write!(
        out,
        "\n{:<10}  {:<3}  {:>14}  {:>14}  {}",
        "Date", "Day", "Planned", "Actual", "Done"
    );
    for row in upcoming {
        let _ = write!(
            out,
            "\n{}  {:<3}  {:>14}  {:>14}  {}",
            row.date.format(DATE_FORMAT),
            row.weekday,
            ctx.money(row.planned_amount),
            ctx.money(row.actual_amount),
            if row.fulfilled { "yes" } else { "-" }
        );
    }
    Ok(out)
}

fn plan_summary(ctx: &ShellContext, plan: &SavingsPlan) -> String {
    format!(
        "Plan {} to {}: {} per working day over {} working days\nFulfilled: {} of {} days, saved {} in plan days",
        plan.start.format(DATE_FORMAT),
        plan.end.format(DATE_FORMAT),
        ctx.money(plan.daily_amount),
        plan.working_days,
        plan.fulfilled_days(),
        plan.rows.len(),
        ctx.money(plan.actual_total())
    )
}

fn export_plan(ctx: &ShellContext, path: PathBuf, horizon: u32) -> CommandResult {
    let plan = PlanService::generate(ctx.store().snapshot(), None, horizon)?;
    let json = serde_json::to_string_pretty(&plan).map_err(SavingsError::from)?;
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(SavingsError::from)?;
    }
    fs::write(&path, json).map_err(SavingsError::from)?;
    tracing::info!(path = %path.display(), rows = plan.rows.len(), "plan exported");
    Ok(format!(
        "{}\nWrote {} rows to {}",
        plan_summary(ctx, &plan),
        plan.rows.len(),
        path.display()
    ))
}

fn cmd_backups(ctx: &mut ShellContext, args: &[&str]) -> CommandResult {
    expect_no_args(args)?;
    let backups = ctx.store().list_backups()?;
    if backups.is_empty() {
        return Ok(format!("No backups for {}.", ctx.store().describe()));
    }
    let mut out = format!("Backups for {}:", ctx.store().describe());
    for backup in backups {
        let created = backup
            .created_at
            .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "unknown time".into());
        let _ = write!(out, "\n  {}  ({})", backup.id, created);
    }
    Ok(out)
}

fn cmd_help(ctx: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args {
        [] => {
            let mut out = String::from("Commands:");
            for entry in ctx.registry.list() {
                let _ = write!(out, "\n  {:<16} {}", entry.label(), entry.description);
            }
            Ok(out)
        }
        [name] => ctx
            .registry
            .get(&name.to_lowercase())
            .map(|entry| format!("{}\n  usage: {}", entry.description, entry.usage))
            .ok_or_else(|| CommandError::UnknownCommand(name.to_string())),
        _ => Err(CommandError::InvalidArguments(
            "`help` takes at most one command".into(),
        )),
    }
}

fn cmd_exit(_ctx: &mut ShellContext, _args: &[&str]) -> CommandResult {
    Err(CommandError::ExitRequested)
}
