use super::open_store;
use crate::cli::args::{Direction, LookupArgs};
use crate::exit_codes::{FAILED, SUCCESS};
use anyhow::Result;
use phonemap_core::LookupService;
use serde_json::json;

pub fn run(args: LookupArgs) -> Result<i32> {
    let lookup = LookupService::new(open_store(&args.store)?);
    let (key, found) = match args.direction {
        Direction::Real => ("real_phone", lookup.resolve_real(&args.number)?),
        Direction::Fake => ("fake_phone", lookup.resolve_fake(&args.number)?),
    };

    match found {
        Some(number) => {
            println!("{}", json!({ "success": true, key: number }));
            Ok(SUCCESS)
        }
        None => {
            println!("{}", json!({ "success": false, "error": "number not found" }));
            Ok(FAILED)
        }
    }
}
