// Copyright (c) 2025 Pocketbook Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .help("Print pretty JSON instead of a table")
            .action(ArgAction::SetTrue),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .help("Print one JSON object per line")
            .action(ArgAction::SetTrue),
    )
}

pub fn build_cli() -> Command {
    Command::new("pocketbook")
        .about("Personal spending tracker with recurring templates and a stealth display mode")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand(Command::new("init").about("Initialize the database"))
        .subcommand(category_cmd())
        .subcommand(tx_cmd())
        .subcommand(recurring_cmd())
        .subcommand(budget_cmd())
        .subcommand(report_cmd())
        .subcommand(export_cmd())
        .subcommand(stealth_cmd())
}

fn category_cmd() -> Command {
    Command::new("category")
        .about("Manage spending categories")
        .subcommand(
            Command::new("add")
                .about("Add a category")
                .arg(Arg::new("name").required(true))
                .arg(Arg::new("icon").long("icon"))
                .arg(Arg::new("color").long("color")),
        )
        .subcommand(Command::new("list").about("List categories"))
        .subcommand(
            Command::new("rm")
                .about("Remove a category")
                .arg(Arg::new("name").required(true)),
        )
}

fn tx_cmd() -> Command {
    Command::new("tx")
        .about("Record and list transactions")
        .subcommand(
            Command::new("add")
                .about("Record a transaction")
                .arg(Arg::new("date").long("date").help("YYYY-MM-DD, defaults to today"))
                .arg(Arg::new("time").long("time").help("HH:MM, defaults to now"))
                .arg(Arg::new("amount").long("amount").required(true))
                .arg(
                    Arg::new("currency")
                        .long("currency")
                        .default_value("USD")
                        .help("USD or CNY"),
                )
                .arg(Arg::new("category").long("category").required(true))
                .arg(Arg::new("description").long("description").required(true))
                .arg(Arg::new("location").long("location")),
        )
        .subcommand(json_flags(
            Command::new("list")
                .about("List transactions (stealth view applies when enabled)")
                .arg(Arg::new("month").long("month").help("Filter by YYYY-MM"))
                .arg(Arg::new("category").long("category").help("Filter by category name"))
                .arg(
                    Arg::new("limit")
                        .long("limit")
                        .value_parser(value_parser!(usize)),
                )
                .arg(
                    Arg::new("raw")
                        .long("raw")
                        .help("Bypass the stealth view and show stored data")
                        .action(ArgAction::SetTrue),
                ),
        ))
}

fn recurring_cmd() -> Command {
    Command::new("recurring")
        .about("Manage recurring transaction templates")
        .subcommand(
            Command::new("add")
                .about("Add a recurring template")
                .arg(Arg::new("name").long("name").required(true))
                .arg(Arg::new("amount").long("amount").required(true))
                .arg(Arg::new("currency").long("currency").default_value("USD"))
                .arg(Arg::new("category").long("category").required(true))
                .arg(Arg::new("description").long("description").required(true))
                .arg(
                    Arg::new("frequency")
                        .long("frequency")
                        .required(true)
                        .help("daily|weekly|biweekly|monthly|quarterly|yearly"),
                )
                .arg(
                    Arg::new("start")
                        .long("start")
                        .help("YYYY-MM-DD, defaults to today"),
                )
                .arg(Arg::new("end").long("end").help("Optional end date, YYYY-MM-DD"))
                .arg(Arg::new("location").long("location")),
        )
        .subcommand(json_flags(
            Command::new("list").about("List recurring templates"),
        ))
        .subcommand(
            Command::new("rm")
                .about("Remove a template")
                .arg(Arg::new("id").required(true).value_parser(value_parser!(i64))),
        )
        .subcommand(
            Command::new("pause")
                .about("Pause a template (it will not fire)")
                .arg(Arg::new("id").required(true).value_parser(value_parser!(i64))),
        )
        .subcommand(
            Command::new("resume")
                .about("Resume a paused template")
                .arg(Arg::new("id").required(true).value_parser(value_parser!(i64))),
        )
        .subcommand(
            Command::new("run")
                .about("Fire all due templates once and advance their schedules"),
        )
}

fn budget_cmd() -> Command {
    Command::new("budget")
        .about("Monthly per-category budget targets")
        .subcommand(
            Command::new("set")
                .about("Set a budget for a month and category")
                .arg(Arg::new("month").long("month").required(true))
                .arg(Arg::new("category").long("category").required(true))
                .arg(Arg::new("amount").long("amount").required(true)),
        )
        .subcommand(
            Command::new("list")
                .about("List budgets")
                .arg(Arg::new("month").long("month")),
        )
        .subcommand(json_flags(
            Command::new("report")
                .about("Budget vs spent for a month")
                .arg(Arg::new("month").long("month").required(true))
                .arg(
                    Arg::new("raw")
                        .long("raw")
                        .help("Bypass the stealth view")
                        .action(ArgAction::SetTrue),
                ),
        ))
}

fn report_cmd() -> Command {
    Command::new("report")
        .about("Spending reports")
        .subcommand(json_flags(
            Command::new("spending")
                .about("Spend by category with percentage shares")
                .arg(Arg::new("month").long("month").required(true))
                .arg(
                    Arg::new("raw")
                        .long("raw")
                        .help("Bypass the stealth view")
                        .action(ArgAction::SetTrue),
                ),
        ))
}

fn export_cmd() -> Command {
    Command::new("export")
        .about("Export stored data (exports are always raw)")
        .subcommand(
            Command::new("transactions")
                .about("Export transactions to a file")
                .arg(
                    Arg::new("format")
                        .long("format")
                        .default_value("csv")
                        .help("csv or json"),
                )
                .arg(Arg::new("out").long("out").required(true)),
        )
}

fn stealth_cmd() -> Command {
    Command::new("stealth")
        .about("Display-only masking of spending data")
        .subcommand(Command::new("on").about("Enable stealth mode"))
        .subcommand(Command::new("off").about("Disable stealth mode"))
        .subcommand(json_flags(
            Command::new("status").about("Show what stealth mode is doing"),
        ))
        .subcommand(
            Command::new("scale")
                .about("Show amounts at a fraction of their true value")
                .arg(
                    Arg::new("percentage")
                        .long("percentage")
                        .value_parser(value_parser!(u32))
                        .help("Show this percent of true amounts (10-100)"),
                )
                .arg(
                    Arg::new("off")
                        .long("off")
                        .help("Disable scaling")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("hide")
                .about("Hide a category from all displays")
                .arg(Arg::new("category").required(true)),
        )
        .subcommand(
            Command::new("unhide")
                .about("Stop hiding a category")
                .arg(Arg::new("category").required(true)),
        )
        .subcommand(
            Command::new("noise")
                .about("Configure decoy transactions (display-only, never stored)")
                .arg(
                    Arg::new("frequency")
                        .long("frequency")
                        .value_parser(value_parser!(u32))
                        .help("Decoys per day"),
                )
                .arg(Arg::new("min").long("min").help("Minimum decoy amount"))
                .arg(Arg::new("max").long("max").help("Maximum decoy amount"))
                .arg(
                    Arg::new("off")
                        .long("off")
                        .help("Disable noise injection")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("preview")
                        .long("preview")
                        .help("Print the decoys that would blend into today's view")
                        .action(ArgAction::SetTrue),
                ),
        )
}
