mod end_to_end;
mod error_handling;
mod store_repair;
mod wire_json;
