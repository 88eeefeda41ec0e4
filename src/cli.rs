// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, arg, value_parser};

fn json_flag() -> Arg {
    arg!(--json "Print JSON instead of a table").action(ArgAction::SetTrue)
}

fn limit_arg() -> Arg {
    arg!(--limit <N> "Maximum rows to show")
        .value_parser(value_parser!(usize))
        .default_value("100")
}

fn chart_add(name: &'static str, kinds: [&'static str; 2]) -> Command {
    Command::new("add")
        .about(format!("Add a {}", name))
        .arg(arg!(<name> "Name").required(true))
        .arg(
            arg!(--type <TYPE>)
                .required(true)
                .value_parser(kinds),
        )
        .arg(arg!(--placeholder "Group node that only aggregates its children").action(ArgAction::SetTrue))
        .arg(arg!(--parent <PARENT> "Placeholder to file this under"))
}

fn stock_action(name: &'static str, about: &'static str) -> Command {
    Command::new(name)
        .about(about)
        .arg(arg!(<stock> "Stock name").required(true))
        .arg(arg!(--date <DATE>).required(true))
        .arg(arg!(--units <UNITS>).required(true))
        .arg(arg!(--nav <NAV>).required(true))
        .arg(arg!(--amount <AMOUNT>).required(true))
        .arg(arg!(--bank <ACCOUNT> "Bank account for the cash leg"))
}

pub fn build_cli() -> Command {
    Command::new("pocketledger")
        .about("Multi-ledger personal accounts, splits, transfers and investments")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(arg!(--db <PATH> "Store file (overrides POCKETLEDGER_DB)").global(true))
        .arg(arg!(-l --ledger <NAME> "Ledger to work on (defaults to the one set with `ledger use`)").global(true))
        .subcommand(Command::new("init").about("Create the store if it does not exist"))
        .subcommand(
            Command::new("ledger")
                .about("Manage ledgers")
                .subcommand(
                    Command::new("add")
                        .arg(arg!(<name> "Ledger name (letters, digits and _, not starting with a digit)").required(true))
                        .arg(
                            arg!(--currency <CCY>)
                                .value_parser(["GBP", "INR", "USD", "gbp", "inr", "usd"])
                                .default_value("GBP"),
                        ),
                )
                .subcommand(Command::new("list").arg(json_flag()))
                .subcommand(
                    Command::new("use")
                        .about("Set the default ledger")
                        .arg(arg!(<name>).required(true)),
                ),
        )
        .subcommand(
            Command::new("account")
                .about("Manage accounts")
                .subcommand(
                    chart_add("account", ["asset", "liability"])
                        .arg(arg!(--opening <AMOUNT> "Opening balance").default_value("0")),
                )
                .subcommand(
                    Command::new("list")
                        .arg(arg!(--type <TYPE>).value_parser(["asset", "liability"]))
                        .arg(arg!(--placeholders "Only placeholder accounts").action(ArgAction::SetTrue))
                        .arg(json_flag()),
                ),
        )
        .subcommand(
            Command::new("category")
                .about("Manage categories")
                .subcommand(chart_add("category", ["income", "expense"]))
                .subcommand(
                    Command::new("list")
                        .arg(arg!(--type <TYPE>).value_parser(["income", "expense"]))
                        .arg(arg!(--placeholders "Only placeholder categories").action(ArgAction::SetTrue))
                        .arg(json_flag()),
                ),
        )
        .subcommand(
            Command::new("tx")
                .about("Transactions")
                .subcommand(
                    Command::new("add")
                        .arg(arg!(--date <DATE>).required(true))
                        .arg(arg!(--account <ACCOUNT>).required(true))
                        .arg(arg!(--credit <AMOUNT> "Money in").conflicts_with("debit"))
                        .arg(arg!(--debit <AMOUNT> "Money out"))
                        .arg(arg!(--category <CATEGORY>).conflicts_with("split"))
                        .arg(
                            arg!(--split <SPLIT> "CATEGORY=AMOUNT, repeatable")
                                .action(ArgAction::Append),
                        )
                        .arg(arg!(--notes <NOTES>).default_value("")),
                )
                .subcommand(
                    Command::new("rm").arg(
                        arg!(<id>)
                            .required(true)
                            .value_parser(value_parser!(i64)),
                    ),
                )
                .subcommand(
                    Command::new("list")
                        .arg(arg!(--account <ACCOUNT> "Account or placeholder, `.` for all"))
                        .arg(arg!(--category <CATEGORY>).conflicts_with("account"))
                        .arg(limit_arg())
                        .arg(json_flag()),
                )
                .subcommand(
                    Command::new("search")
                        .arg(arg!(<keywords> "Space separated words that must all match").required(true))
                        .arg(limit_arg())
                        .arg(json_flag()),
                )
                .subcommand(
                    Command::new("splits").arg(
                        arg!(<id>)
                            .required(true)
                            .value_parser(value_parser!(i64)),
                    ),
                )
                .subcommand(
                    Command::new("suggest")
                        .about("Previous notes matching the given words")
                        .arg(arg!([keywords]).default_value(""))
                        .arg(arg!(--transfers "Suggest transfer notes").action(ArgAction::SetTrue)),
                ),
        )
        .subcommand(
            Command::new("stock")
                .about("Mutual funds, gold and other holdings")
                .subcommand(
                    Command::new("add")
                        .arg(arg!(<name>).required(true))
                        .arg(
                            arg!(--type <TYPE>)
                                .value_parser(["mutual fund", "mf", "gold", "others"])
                                .default_value("mutual fund"),
                        )
                        .arg(arg!(--code <CODE> "Scheme code used by the NAV feed").default_value(""))
                        .arg(arg!(--plan <PLAN>).default_value("")),
                )
                .subcommand(
                    Command::new("list")
                        .arg(arg!(--status <STATUS>).value_parser(["active", "holding"]))
                        .arg(json_flag()),
                )
                .subcommand(Command::new("toggle").arg(arg!(<name>).required(true)))
                .subcommand(stock_action("buy", "Purchase units"))
                .subcommand(stock_action("redeem", "Redeem units"))
                .subcommand(
                    Command::new("switch")
                        .about("Move an amount from one stock into another")
                        .arg(arg!(--from <STOCK>).required(true))
                        .arg(arg!(--to <STOCK>).required(true))
                        .arg(arg!(--date <DATE>).required(true))
                        .arg(arg!(--"from-units" <UNITS>).required(true))
                        .arg(arg!(--"to-units" <UNITS>).required(true))
                        .arg(arg!(--amount <AMOUNT>).required(true)),
                )
                .subcommand(
                    Command::new("history")
                        .arg(arg!(<name>).required(true))
                        .arg(json_flag()),
                )
                .subcommand(Command::new("refresh").about("Fetch mutual fund NAVs and the gold price")),
        )
        .subcommand(
            Command::new("transfer")
                .about("Move money between accounts")
                .subcommand(
                    Command::new("local")
                        .arg(arg!(--from <ACCOUNT>).required(true))
                        .arg(arg!(--to <ACCOUNT>).required(true))
                        .arg(arg!(--date <DATE>).required(true))
                        .arg(arg!(--amount <AMOUNT>).required(true))
                        .arg(arg!(--notes <NOTES>).default_value("")),
                )
                .subcommand(
                    Command::new("cross")
                        .arg(arg!(--"to-ledger" <LEDGER>).required(true))
                        .arg(arg!(--from <ACCOUNT>).required(true))
                        .arg(arg!(--to <ACCOUNT>).required(true))
                        .arg(arg!(--date <DATE>).required(true))
                        .arg(arg!(--amount <AMOUNT> "Amount sent").required(true))
                        .arg(arg!(--received <AMOUNT> "Amount received, when the currencies differ"))
                        .arg(arg!(--fee <AMOUNT>).requires("fee-category"))
                        .arg(arg!(--"fee-category" <CATEGORY>))
                        .arg(arg!(--notes <NOTES>).default_value("")),
                ),
        )
        .subcommand(
            Command::new("stats")
                .about("Income or expense per month or year")
                .arg(arg!(--category <CATEGORY>).conflicts_with("kind"))
                .arg(
                    arg!(--kind <KIND>)
                        .value_parser(["income", "expense"])
                        .default_value("expense"),
                )
                .arg(
                    arg!(--period <PERIOD>)
                        .value_parser(["monthly", "yearly"])
                        .default_value("monthly"),
                )
                .arg(
                    arg!(--count <N>)
                        .value_parser(value_parser!(usize))
                        .default_value("6"),
                )
                .arg(arg!(--"as-of" <DATE> "Last day to include (default today)"))
                .arg(json_flag()),
        )
        .subcommand(
            Command::new("backup")
                .about("Copy the store file and prune old copies")
                .arg(
                    arg!(--"keep-days" <DAYS>)
                        .value_parser(value_parser!(u64))
                        .default_value("5"),
                ),
        )
}
