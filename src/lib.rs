//! # Jal Dashboard Core
//!
//! Filter state, filter persistence and view composition for the central
//! rural water-supply dashboard. The dashboard drills down a five-level
//! geographic hierarchy (state, district, block, gram panchayat, village) and
//! an independent department hierarchy; this crate owns every decision that
//! depends on those selections and hands the UI host fully resolved data.
//!
//! ## Features
//!
//! - **Cascading filters**: changing a level clears every level below it
//! - **Write-through persistence**: filters survive restarts in an LMDB store;
//!   corrupt snapshots are discarded, never surfaced
//! - **Drill-down resolution**: one depth value drives labels, option lists and
//!   the performance table shown
//! - **Synthesized breakdowns**: coarse series are remapped onto finer entities
//!   deterministically
//! - **View composition**: panel sets per drill level, village view first
//! - **FFI surface**: C-compatible functions exchanging JSON, no `unwrap()` in
//!   production code
//!
//! ## Quick Start
//!
//! ```no_run
//! use jal_dashboard_core::{create_dashboard, set_geo_level, compose_dashboard};
//! use std::ffi::CString;
//!
//! let name = CString::new("central_dashboard").unwrap();
//! let dashboard = create_dashboard(name.as_ptr());
//!
//! let level = CString::new("state").unwrap();
//! let value = CString::new("PB").unwrap();
//! let filters = set_geo_level(dashboard, level.as_ptr(), value.as_ptr());
//! let view = compose_dashboard(dashboard);
//! ```
//!
//! ## FFI Functions
//!
//! - [`create_dashboard`] / [`create_dashboard_with_config`] - Open storage and restore filters
//! - [`set_geo_level`], [`set_department_level`], [`set_scheme`], [`set_duration`],
//!   [`set_filter_tab`], [`clear_filters`] - Filter setters
//! - [`get_filters`], [`resolve_filters`] - Read the state and its resolution
//! - [`load_lookup_tables`], [`set_performance_focus`] - Static tables and view options
//! - [`begin_dashboard_fetch`], [`complete_dashboard_fetch`], [`fail_dashboard_fetch`] - Source data hand-off
//! - [`compose_dashboard`] - Panels to render
//! - [`dashboard_endpoint`] - API path for a fetch
//! - [`free_response`], [`close_dashboard`] - Release memory

pub mod app_response;
pub mod dashboard;
pub mod dashboard_data;
pub mod filter_state;
pub mod filter_store;
pub mod hierarchy;
pub mod local_db_model;
pub mod local_db_state;
pub mod series;
pub mod view;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use log::{info, warn};
use serde::Serialize;

use crate::app_response::AppResponse;
use crate::dashboard::{Dashboard, DashboardConfig};
use crate::dashboard_data::{DashboardLevel, LoadState};
use crate::filter_state::{DateRange, DepartmentLevel, GeoLevel};
use crate::hierarchy::LookupTables;

/// Opens the dashboard with filter storage at `<name>.lmdb`.
///
/// # Returns
///
/// A pointer to the [`Dashboard`], or null if the name is null, not UTF-8, or
/// the storage cannot be opened. Release it with [`close_dashboard`].
///
/// # Examples
///
/// ```no_run
/// use std::ffi::CString;
/// use jal_dashboard_core::create_dashboard;
///
/// let name = CString::new("central_dashboard").unwrap();
/// let dashboard = create_dashboard(name.as_ptr());
/// assert!(!dashboard.is_null());
/// ```
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn create_dashboard(name: *const c_char) -> *mut Dashboard {
    if name.is_null() {
        warn!("Null name pointer passed to create_dashboard");
        return std::ptr::null_mut();
    }

    let name_str = match unsafe { CStr::from_ptr(name).to_str() } {
        Ok(s) => s,
        Err(e) => {
            warn!("Invalid UTF-8 in name parameter: {e}");
            return std::ptr::null_mut();
        }
    };

    open_dashboard(&DashboardConfig::with_db_name(name_str))
}

/// Opens the dashboard from a JSON [`DashboardConfig`].
///
/// Missing config fields take their defaults, so `{}` is a valid config.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn create_dashboard_with_config(config_json: *const c_char) -> *mut Dashboard {
    if config_json.is_null() {
        warn!("Null config pointer passed to create_dashboard_with_config");
        return std::ptr::null_mut();
    }

    let json = match unsafe { CStr::from_ptr(config_json).to_str() } {
        Ok(s) => s,
        Err(e) => {
            warn!("Invalid UTF-8 in config parameter: {e}");
            return std::ptr::null_mut();
        }
    };

    match serde_json::from_str::<DashboardConfig>(json) {
        Ok(config) => open_dashboard(&config),
        Err(e) => {
            warn!("Invalid dashboard config: {e}");
            std::ptr::null_mut()
        }
    }
}

fn open_dashboard(config: &DashboardConfig) -> *mut Dashboard {
    info!("Opening dashboard storage at: {}.lmdb", config.db_name);
    match Dashboard::open(config) {
        Ok(dashboard) => Box::into_raw(Box::new(dashboard)),
        Err(e) => {
            warn!("Failed to open dashboard: {e}");
            std::ptr::null_mut()
        }
    }
}

/// Sets a geographic level and clears every level below it.
///
/// `level` is one of `state`, `district`, `block`, `gramPanchayat`, `village`.
/// A null or empty `value` clears the level. Returns the filter state.
///
/// # Examples
///
/// ```no_run
/// use std::ffi::CString;
/// use jal_dashboard_core::{create_dashboard, set_geo_level};
///
/// let dashboard = create_dashboard(CString::new("dash").unwrap().as_ptr());
/// let level = CString::new("district").unwrap();
/// let value = CString::new("LDH").unwrap();
/// let filters = set_geo_level(dashboard, level.as_ptr(), value.as_ptr());
/// ```
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn set_geo_level(
    state: *mut Dashboard,
    level: *const c_char,
    value: *const c_char,
) -> *const c_char {
    let dashboard = match dashboard_mut(state, "set_geo_level") {
        Ok(d) => d,
        Err(err) => return err,
    };
    let level = match c_ptr_to_string(level, "level") {
        Ok(l) => l,
        Err(err) => return err,
    };
    let level: GeoLevel = match level.parse() {
        Ok(l) => l,
        Err(e) => return response_to_c_string(&e),
    };
    let value = match optional_c_string(value, "value") {
        Ok(v) => v,
        Err(err) => return err,
    };

    dashboard.set_level(level, value);
    json_response(dashboard.filters())
}

/// Sets a department level and clears every department level below it.
///
/// `level` is one of `state`, `zone`, `circle`, `division`, `subdivision`,
/// `village`. The geographic selection is not touched.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn set_department_level(
    state: *mut Dashboard,
    level: *const c_char,
    value: *const c_char,
) -> *const c_char {
    let dashboard = match dashboard_mut(state, "set_department_level") {
        Ok(d) => d,
        Err(err) => return err,
    };
    let level = match c_ptr_to_string(level, "level") {
        Ok(l) => l,
        Err(err) => return err,
    };
    let level: DepartmentLevel = match level.parse() {
        Ok(l) => l,
        Err(e) => return response_to_c_string(&e),
    };
    let value = match optional_c_string(value, "value") {
        Ok(v) => v,
        Err(err) => return err,
    };

    dashboard.set_department_level(level, value);
    json_response(dashboard.filters())
}

/// Sets the scheme filter. Neither hierarchy is touched.
///
/// # Parameters
///
/// * `state` - Pointer to the dashboard returned by [`create_dashboard`]
/// * `value` - Scheme id; null or empty clears the filter
///
/// # Returns
///
/// `Ok` carrying the filter state as JSON, or `BadRequest` for a null state
/// pointer or invalid UTF-8. Free the string with [`free_response`].
///
/// # Examples
///
/// ```no_run
/// use std::ffi::CString;
/// use jal_dashboard_core::{create_dashboard, set_scheme};
///
/// let dashboard = create_dashboard(CString::new("dash").unwrap().as_ptr());
/// let scheme = CString::new("RWS-001").unwrap();
/// let filters = set_scheme(dashboard, scheme.as_ptr());
/// let cleared = set_scheme(dashboard, std::ptr::null());
/// ```
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn set_scheme(state: *mut Dashboard, value: *const c_char) -> *const c_char {
    let dashboard = match dashboard_mut(state, "set_scheme") {
        Ok(d) => d,
        Err(err) => return err,
    };
    let value = match optional_c_string(value, "value") {
        Ok(v) => v,
        Err(err) => return err,
    };

    dashboard.set_scheme(value);
    json_response(dashboard.filters())
}

/// Sets the reporting window from `{"startDate": .., "endDate": ..}`.
///
/// A null pointer or the JSON literal `null` clears the duration.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn set_duration(state: *mut Dashboard, range_json: *const c_char) -> *const c_char {
    let dashboard = match dashboard_mut(state, "set_duration") {
        Ok(d) => d,
        Err(err) => return err,
    };
    let json = match optional_c_string(range_json, "duration") {
        Ok(j) => j,
        Err(err) => return err,
    };

    let duration = match json {
        None => None,
        Some(json) => match serde_json::from_str::<Option<DateRange>>(&json) {
            Ok(range) => range,
            Err(e) => {
                let error = AppResponse::SerializationError(format!("Invalid duration: {e}"));
                return response_to_c_string(&error);
            }
        },
    };

    dashboard.set_duration(duration);
    json_response(dashboard.filters())
}

/// Switches the filter tab (0 geographic, 1 department). Selections are kept.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn set_filter_tab(state: *mut Dashboard, index: i64) -> *const c_char {
    let dashboard = match dashboard_mut(state, "set_filter_tab") {
        Ok(d) => d,
        Err(err) => return err,
    };

    match dashboard.set_tab(index) {
        Ok(_) => json_response(dashboard.filters()),
        Err(e) => response_to_c_string(&e),
    }
}

/// Clears both hierarchies, the scheme and the duration. The tab is kept.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn clear_filters(state: *mut Dashboard) -> *const c_char {
    let dashboard = match dashboard_mut(state, "clear_filters") {
        Ok(d) => d,
        Err(err) => return err,
    };

    dashboard.clear_all();
    json_response(dashboard.filters())
}

/// Returns the current filter state without changing it.
///
/// # Parameters
///
/// * `state` - Pointer to the dashboard returned by [`create_dashboard`]
///
/// # Returns
///
/// `Ok` carrying the filter state as JSON:
///
/// ```text
/// {"geographic": {"state": "PB", "district": null, ...},
///  "scheme": null, "duration": null,
///  "department": {"state": null, ...}, "activeTab": "geographic"}
/// ```
///
/// `BadRequest` if `state` is null.
///
/// # Examples
///
/// ```no_run
/// use std::ffi::CString;
/// use jal_dashboard_core::{create_dashboard, free_response, get_filters};
///
/// let dashboard = create_dashboard(CString::new("dash").unwrap().as_ptr());
/// let filters = get_filters(dashboard);
/// free_response(filters);
/// ```
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_filters(state: *mut Dashboard) -> *const c_char {
    match dashboard_mut(state, "get_filters") {
        Ok(dashboard) => json_response(dashboard.filters()),
        Err(err) => err,
    }
}

/// Resolves the current filters against the lookup tables.
///
/// # Parameters
///
/// * `state` - Pointer to the dashboard returned by [`create_dashboard`]
///
/// # Returns
///
/// `Ok` carrying the resolution as JSON: `depth` (0 to 5), `villageSelected`,
/// `entityLabel`, `nextLevel`, `childOptions`, `activeTable`, the option
/// lists of both filter bars and selector availability. Unknown ids resolve
/// to empty lists. `BadRequest` if `state` is null.
///
/// # Examples
///
/// ```no_run
/// use std::ffi::CString;
/// use jal_dashboard_core::{create_dashboard, resolve_filters, set_geo_level};
///
/// let dashboard = create_dashboard(CString::new("dash").unwrap().as_ptr());
/// let level = CString::new("state").unwrap();
/// let value = CString::new("PB").unwrap();
/// set_geo_level(dashboard, level.as_ptr(), value.as_ptr());
///
/// // {"Ok":"{\"depth\":1,\"entityLabel\":\"Districts\",...}"}
/// let resolved = resolve_filters(dashboard);
/// ```
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn resolve_filters(state: *mut Dashboard) -> *const c_char {
    match dashboard_mut(state, "resolve_filters") {
        Ok(dashboard) => json_response(&dashboard.resolve()),
        Err(err) => err,
    }
}

/// Replaces the lookup tables with the given JSON [`LookupTables`].
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn load_lookup_tables(state: *mut Dashboard, json_ptr: *const c_char) -> *const c_char {
    let dashboard = match dashboard_mut(state, "load_lookup_tables") {
        Ok(d) => d,
        Err(err) => return err,
    };
    let json = match c_ptr_to_string(json_ptr, "JSON") {
        Ok(j) => j,
        Err(err) => return err,
    };

    match serde_json::from_str::<LookupTables>(&json) {
        Ok(lookups) => {
            dashboard.set_lookups(lookups);
            response_to_c_string(&AppResponse::success("Lookup tables loaded"))
        }
        Err(e) => {
            let error = AppResponse::SerializationError(format!("Invalid lookup tables: {e}"));
            response_to_c_string(&error)
        }
    }
}

/// Narrows the top-level performance chart to the state with this name.
/// A null or empty name removes the focus.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn set_performance_focus(state: *mut Dashboard, name: *const c_char) -> *const c_char {
    let dashboard = match dashboard_mut(state, "set_performance_focus") {
        Ok(d) => d,
        Err(err) => return err,
    };
    let name = match optional_c_string(name, "name") {
        Ok(n) => n,
        Err(err) => return err,
    };

    dashboard.set_performance_focus(name);
    response_to_c_string(&AppResponse::success("Performance focus updated"))
}

/// Marks a fetch as outstanding; [`compose_dashboard`] reports `loading` until
/// the fetch completes or fails.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn begin_dashboard_fetch(state: *mut Dashboard) -> *const c_char {
    match dashboard_mut(state, "begin_dashboard_fetch") {
        Ok(dashboard) => {
            dashboard.begin_fetch();
            response_to_c_string(&AppResponse::success("Fetch started"))
        }
        Err(err) => err,
    }
}

/// Hands the fetched snapshot JSON to the dashboard.
///
/// The response is `InvalidData` listing missing or mistyped fields,
/// `FetchError` for unparsable JSON, or `Ok`. In every case the dashboard leaves the
/// pending state.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn complete_dashboard_fetch(state: *mut Dashboard, json_ptr: *const c_char) -> *const c_char {
    let dashboard = match dashboard_mut(state, "complete_dashboard_fetch") {
        Ok(d) => d,
        Err(err) => return err,
    };
    let json = match c_ptr_to_string(json_ptr, "JSON") {
        Ok(j) => j,
        Err(err) => return err,
    };

    let result = serde_json::from_str(&json).map_err(AppResponse::from);
    dashboard.complete_fetch(result);

    let response = match dashboard.load_state() {
        LoadState::Ready(_) => AppResponse::success("Dashboard data loaded"),
        LoadState::Invalid(missing) => AppResponse::InvalidData(missing.clone()),
        LoadState::Failed(message) => AppResponse::FetchError(message.clone()),
        LoadState::Pending => AppResponse::success("Fetch pending"),
    };
    if response.is_user_visible() {
        warn!("Dashboard data rejected: {response}");
    }
    response_to_c_string(&response)
}

/// Records a failed fetch with the provider's message.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn fail_dashboard_fetch(state: *mut Dashboard, message: *const c_char) -> *const c_char {
    let dashboard = match dashboard_mut(state, "fail_dashboard_fetch") {
        Ok(d) => d,
        Err(err) => return err,
    };
    let message = match optional_c_string(message, "message") {
        Ok(m) => m.unwrap_or_else(|| "Unknown error".to_string()),
        Err(err) => return err,
    };

    dashboard.complete_fetch(Err(AppResponse::FetchError(message)));
    response_to_c_string(&AppResponse::success("Fetch failure recorded"))
}

/// Returns the dashboard status: `loading`, `error`, `invalidData`, or `ready`
/// with the ordered panels and their data.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn compose_dashboard(state: *mut Dashboard) -> *const c_char {
    match dashboard_mut(state, "compose_dashboard") {
        Ok(dashboard) => json_response(&dashboard.compose()),
        Err(err) => err,
    }
}

/// API path for fetching `level` (`central`, `state`, ...) of `entity_id`.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn dashboard_endpoint(level: *const c_char, entity_id: *const c_char) -> *const c_char {
    let level = match c_ptr_to_string(level, "level") {
        Ok(l) => l,
        Err(err) => return err,
    };
    let entity_id = match optional_c_string(entity_id, "entityId") {
        Ok(id) => id,
        Err(err) => return err,
    };

    let level: DashboardLevel = match serde_json::from_value(serde_json::Value::String(level.clone())) {
        Ok(l) => l,
        Err(_) => {
            let error = AppResponse::BadRequest(format!("Unknown dashboard level: {level}"));
            return response_to_c_string(&error);
        }
    };

    match level.endpoint(entity_id.as_deref()) {
        Ok(path) => response_to_c_string(&AppResponse::Ok(path)),
        Err(e) => response_to_c_string(&e),
    }
}

/// Frees a string returned by any function of this library.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn free_response(ptr: *const c_char) {
    if ptr.is_null() {
        return;
    }
    unsafe {
        drop(CString::from_raw(ptr as *mut c_char));
    }
}

/// Releases the dashboard. The persisted filters stay on disk.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn close_dashboard(state: *mut Dashboard) -> *const c_char {
    if state.is_null() {
        let error = AppResponse::BadRequest("Null state pointer passed to close_dashboard".to_string());
        return response_to_c_string(&error);
    }

    unsafe {
        drop(Box::from_raw(state));
    }
    info!("Dashboard closed");
    response_to_c_string(&AppResponse::success("Dashboard closed successfully"))
}

/// Serializes `value` and wraps it in `AppResponse::Ok`.
fn json_response<T: Serialize>(value: &T) -> *const c_char {
    match serde_json::to_string(value) {
        Ok(json) => response_to_c_string(&AppResponse::Ok(json)),
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Converts an [`AppResponse`] to a C string the caller must free with
/// [`free_response`]. Null if serialization fails.
fn response_to_c_string(response: &AppResponse) -> *const c_char {
    let json = match serde_json::to_string(response) {
        Ok(j) => j,
        Err(e) => {
            warn!("Error serializing response: {e}");
            return std::ptr::null();
        }
    };

    match CString::new(json) {
        Ok(c_str) => c_str.into_raw(),
        Err(e) => {
            warn!("Error creating CString: {e}");
            std::ptr::null()
        }
    }
}

fn dashboard_mut<'a>(state: *mut Dashboard, fn_name: &str) -> Result<&'a mut Dashboard, *const c_char> {
    match unsafe { state.as_mut() } {
        Some(dashboard) => Ok(dashboard),
        None => {
            let error = AppResponse::BadRequest(format!("Null state pointer passed to {fn_name}"));
            Err(response_to_c_string(&error))
        }
    }
}

/// Converts a C string pointer to a Rust String.
///
/// On failure returns the error response already converted for the caller.
fn c_ptr_to_string(ptr: *const c_char, field_name: &str) -> Result<String, *const c_char> {
    if ptr.is_null() {
        let error = AppResponse::BadRequest(format!("Null {field_name} pointer"));
        return Err(response_to_c_string(&error));
    }

    match unsafe { CStr::from_ptr(ptr).to_str() } {
        Ok(s) => Ok(s.to_string()),
        Err(e) => {
            let error = AppResponse::BadRequest(format!("Invalid UTF-8 in {field_name}: {e}"));
            Err(response_to_c_string(&error))
        }
    }
}

/// Like [`c_ptr_to_string`], but null and empty strings mean "no value".
fn optional_c_string(ptr: *const c_char, field_name: &str) -> Result<Option<String>, *const c_char> {
    if ptr.is_null() {
        return Ok(None);
    }
    c_ptr_to_string(ptr, field_name).map(|s| Some(s).filter(|s| !s.is_empty()))
}
