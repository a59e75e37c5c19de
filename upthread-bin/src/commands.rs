use std::env;
use tokio::runtime::Runtime;
use upthread_lib::{display_count, tally, Error, ErrorKind, Overlord, PostId, GLOBALS};

#[derive(Debug, Clone)]
pub struct Command {
    cmd: &'static str,
    usage_params: &'static str,
    desc: &'static str,
}

impl Command {
    fn usage(&self, msg: String) -> Result<(), Error> {
        Err(self.usage_error(msg))
    }

    #[track_caller]
    fn usage_error(&self, msg: String) -> Error {
        ErrorKind::Usage(
            msg,
            format!("Usage: upthread {} {}", self.cmd, self.usage_params),
        )
        .into()
    }
}

const COMMANDS: [Command; 5] = [
    Command {
        cmd: "help",
        usage_params: "<command>",
        desc: "show this list",
    },
    Command {
        cmd: "login",
        usage_params: "<username>",
        desc: "sign in on the command line before starting the upthread GUI",
    },
    Command {
        cmd: "offline",
        usage_params: "",
        desc: "start upthread in offline mode, against built-in demo data",
    },
    Command {
        cmd: "print_votes",
        usage_params: "<post_id>",
        desc: "print the votes on a post along with the count shown on its card",
    },
    Command {
        cmd: "vote",
        usage_params: "<post_id> up|down",
        desc: "vote on a post as the signed in user",
    },
];

/// Returns true if the program should exit instead of starting the GUI
pub fn handle_command(mut args: env::Args, rt: &Runtime) -> Result<bool, Error> {
    let _ = args.next(); // program name
    let command_string = match args.next() {
        Some(c) => c,
        None => return Ok(false),
    };

    let command = match COMMANDS.iter().find(|c| c.cmd == command_string) {
        Some(c) => c.to_owned(),
        None => return Err(ErrorKind::UnknownCommand(command_string).into()),
    };

    match command.cmd {
        "help" => help(command, args)?,
        "login" => {
            login(command, args)?;
            return Ok(false);
        }
        "offline" => {
            offline()?;
            return Ok(false);
        }
        "print_votes" => print_votes(command, args, rt)?,
        "vote" => vote(command, args, rt)?,
        other => println!("Unknown command {}", other),
    }

    Ok(true)
}

pub fn help(_cmd: Command, mut args: env::Args) -> Result<(), Error> {
    if let Some(sub) = args.next() {
        for c in COMMANDS.iter() {
            if sub == c.cmd {
                println!("upthread {} {}", c.cmd, c.usage_params);
                println!("    {}", c.desc);
                return Ok(());
            }
        }
        println!("No such command {}", sub);
    } else {
        for c in COMMANDS.iter() {
            println!("  {} {}", c.cmd, c.usage_params);
        }
    }
    Ok(())
}

pub fn login(cmd: Command, mut args: env::Args) -> Result<(), Error> {
    let name = match args.next() {
        Some(n) => n,
        None => return cmd.usage("Missing username parameter".to_string()),
    };

    Overlord::sign_in(&name)?;
    GLOBALS.settings.read().save()?;
    println!("Signed in as {}", name.trim());
    Ok(())
}

pub fn offline() -> Result<(), Error> {
    GLOBALS.settings.write().offline = true;
    GLOBALS.settings.read().save()?;
    Ok(())
}

fn parse_post_id(cmd: &Command, arg: Option<String>) -> Result<PostId, Error> {
    let arg = match arg {
        Some(a) => a,
        None => return Err(cmd.usage_error("Missing post_id parameter".to_string())),
    };
    match arg.parse::<PostId>() {
        Ok(id) => Ok(id),
        Err(_) => Err(cmd.usage_error(format!("Bad post id {}", arg))),
    }
}

pub fn print_votes(cmd: Command, mut args: env::Args, rt: &Runtime) -> Result<(), Error> {
    let post_id = parse_post_id(&cmd, args.next())?;

    let api = upthread_lib::api::from_settings(&GLOBALS.settings.read())?;
    let votes = rt.block_on(api.get_votes_by_post_id(post_id))?;
    let viewer = GLOBALS.session.viewer();

    for vote in votes.iter() {
        let mark = if viewer.as_ref().map(|v| v.name == vote.username) == Some(true) {
            " (you)"
        } else {
            ""
        };
        let arrow = if vote.upvote { "up" } else { "down" };
        println!("{} {}{}", arrow, vote.username, mark);
    }
    println!("votes: {}", votes.len());
    println!("tally: {}", tally(&votes));
    println!("shown: {}", display_count(&votes));
    Ok(())
}

pub fn vote(cmd: Command, mut args: env::Args, rt: &Runtime) -> Result<(), Error> {
    let post_id = parse_post_id(&cmd, args.next())?;
    let upvote = match args.next().as_deref() {
        Some("up") => true,
        Some("down") => false,
        _ => return cmd.usage("Expected up or down".to_string()),
    };

    let viewer = match GLOBALS.session.viewer() {
        Some(v) => v,
        None => return Err(ErrorKind::NotSignedIn.into()),
    };

    let api = upthread_lib::api::from_settings(&GLOBALS.settings.read())?;
    rt.block_on(api.add_vote(post_id, &viewer.name, upvote))?;
    let votes = rt.block_on(api.get_votes_by_post_id(post_id))?;
    println!(
        "{} voted {} on {}, now showing {}",
        viewer.name,
        if upvote { "up" } else { "down" },
        post_id,
        display_count(&votes)
    );
    Ok(())
}
