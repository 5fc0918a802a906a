use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    println!("crater {}", env!("CARGO_PKG_VERSION"));
    if !args.extended {
        return Ok(SUCCESS);
    }

    println!(
        "target: {}",
        option_env!("CRATER_BUILD_TARGET").unwrap_or("unknown")
    );
    println!(
        "wire: mavlink v2, max frame {} bytes",
        crater_link::MAX_FRAME_LEN
    );
    println!(
        "dialect: {}",
        crater_link::messages::MESSAGES
            .iter()
            .map(|meta| format!("{}({})", meta.name, meta.id))
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("features: async={}", cfg!(feature = "async"));

    Ok(SUCCESS)
}
