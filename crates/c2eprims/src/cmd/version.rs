use c2eprims_transport::InterfaceKind;

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("c2eprims {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    let supported: Vec<&str> = InterfaceKind::ALL
        .into_iter()
        .filter(|kind| kind.supported())
        .map(InterfaceKind::name)
        .collect();

    println!("name: c2eprims");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "build_target: {}",
        option_env!("C2EPRIMS_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!("interfaces: {}", supported.join(", "));
    println!("default_interface: {}", InterfaceKind::default_for_platform());

    Ok(SUCCESS)
}
