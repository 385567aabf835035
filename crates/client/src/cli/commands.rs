use std::path::PathBuf;

use clap::{
    Arg, ColorChoice, Command,
    builder::styling::{AnsiColor, Effects, Styles},
};

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("igaku")
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("api-url")
                .long("api-url")
                .help("Base url of the remote API (overrides IGAKU_API_URL)")
                .global(true),
        )
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .help("Directory holding the session credential and profile cache (overrides IGAKU_DATA_DIR)")
                .value_parser(clap::value_parser!(PathBuf))
                .global(true),
        )
        .subcommand(
            Command::new("login")
                .about("Sign in and store the session credential")
                .arg(Arg::new("username").required(true))
                .arg(password()),
        )
        .subcommand(
            Command::new("register")
                .about("Create an account and sign in")
                .arg(Arg::new("username").required(true))
                .arg(Arg::new("email").required(true))
                .arg(password()),
        )
        .subcommand(Command::new("logout").about("Remove the session credential"))
        .subcommand(Command::new("profile").about("Show the signed-in account"))
        .subcommand(with_list_args(
            Command::new("users").about("List users (admin only)"),
        ))
        .subcommand(with_list_args(
            Command::new("export").about("Print one page of users as CSV rows (admin only)"),
        ))
}

fn password() -> Arg {
    Arg::new("password")
        .short('p')
        .long("password")
        .help("Account password")
        .env("IGAKU_PASSWORD")
        .hide_env_values(true)
        .required(true)
}

fn with_list_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("page")
                .long("page")
                .default_value("1")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new("page-size")
                .long("page-size")
                .default_value("10")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new("order-by")
                .long("order-by")
                .default_value("id")
                .value_parser(["id", "username"]),
        )
        .arg(
            Arg::new("order-method")
                .long("order-method")
                .default_value("asc")
                .value_parser(["asc", "desc"]),
        )
}
