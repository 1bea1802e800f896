//! Database operations for the vehicle registry

pub mod vehicles;

pub use vehicles::{
    count_vehicles, find_by_key, insert_vehicle, list_vehicles, resolve_sort, update_vehicle,
    SortColumn, SortOrder, StoredVehicle, VehicleSummary,
};
