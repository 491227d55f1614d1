use std::{
    io::{self, Write},
    process::ExitCode,
};

use clap::Parser;
use fontqa::{is_failure, output, registry, selected_checks, Args, Error};

fn main() -> Result<ExitCode, Error> {
    env_logger::builder()
        .format(|buf, record| {
            let ts = buf.timestamp_micros();
            writeln!(
                buf,
                "{}: {:?}: {}: {}",
                ts,
                std::thread::current().id(),
                buf.default_level_style(record.level())
                    .value(record.level()),
                record.args()
            )
        })
        .init();

    let args = Args::parse();
    let mut stdout = io::stdout().lock();

    if args.list_checks {
        let registry = registry()?;
        let checks = selected_checks(&args, &registry)?;
        output::write_check_list(&checks, &mut stdout).map_err(Error::StdioWriteFail)?;
        return Ok(ExitCode::SUCCESS);
    }

    let report = fontqa::run(&args)?;
    output::write_text(&report, &mut stdout).map_err(Error::StdioWriteFail)?;

    Ok(if is_failure(&report, args.error_on) {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
