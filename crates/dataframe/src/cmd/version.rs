use dataframe_core::TypeRegistry;

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("dataframe {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: dataframe");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "build_target: {}",
        option_env!("DATAFRAME_BUILD_TARGET").unwrap_or("unknown")
    );
    let tags: Vec<&str> = TypeRegistry::global().iter().map(|codec| codec.tag()).collect();
    println!("codecs: {}", tags.join(","));
    println!("features: json={}, cli=true", cfg!(feature = "json"));

    Ok(SUCCESS)
}
