use clap::Parser;
use env_logger::Env;
use lensbench::{
    console::{simulate, write_output, Args, PartialArgs},
    error::BenchResult,
};

fn main() -> BenchResult<()> {
    let args = Args::try_from(PartialArgs::parse())?;
    let mut logger = env_logger::Builder::from_env(Env::default().default_filter_or("info"));
    if let Some(level) = args.log_level {
        logger.filter_level(level.into());
    }
    logger.init();
    let sink = simulate(&args)?;
    write_output(&args, &sink)
}
