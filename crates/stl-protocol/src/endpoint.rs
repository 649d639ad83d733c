use crate::operation::OperationKind;
use crate::request::Method;

/// Host fragment identifying the v2 cloud-function gateway.
pub const V2_GATEWAY_SIGNATURE: &str = "cloudfunctions.net";

/// Content type of the binary timeline encoding, both as a request
/// announcement and as a response declaration.
pub const BINARY_CONTENT_TYPE: &str = "application/storage-timeline";

/// Content type sent with form-encoded write bodies.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Parameter names shared by both dialects.
pub mod params {
    pub const SCHEMA: &str = "schema";
    pub const TIME_LINE: &str = "timeLine";
    pub const VALUE: &str = "value";
    pub const TIME: &str = "time";
    pub const FORMAT: &str = "format";
    pub const ACTION: &str = "action";
}

/// v1 path suffixes, appended to the base URI.
pub mod paths {
    pub const STORAGE_LIST: &str = "/storage/list";
    pub const SCHEMA_LIST: &str = "/schema/list";
    pub const ALL_NUMBERS: &str = "/timeline/all/numbers";
    pub const ALL_STRINGS: &str = "/timeline/all/strings";
    pub const ADD_NUMBER: &str = "/timeline/add/number";
    pub const ADD_STRING: &str = "/timeline/add/string";
}

/// How one operation is expressed in one dialect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Route {
    pub method: Method,
    /// Suffix appended to the base URI. Empty for the single v2 endpoint.
    pub path: &'static str,
    /// Fixed parameters placed ahead of the operation's own parameters.
    pub selector: &'static [(&'static str, &'static str)],
}

/// One row of the dialect table.
#[derive(Clone, Copy, Debug)]
pub struct RouteEntry {
    pub kind: OperationKind,
    pub v1: Route,
    pub v2: Route,
}

const fn v1(method: Method, path: &'static str) -> Route {
    Route { method, path, selector: &[] }
}

const fn v2(method: Method, selector: &'static [(&'static str, &'static str)]) -> Route {
    Route { method, path: "", selector }
}

/// Operation × dialect table. Rows are indexed by `OperationKind as usize`.
pub const ROUTES: [RouteEntry; 6] = [
    RouteEntry {
        kind: OperationKind::StorageList,
        v1: v1(Method::Get, paths::STORAGE_LIST),
        v2: v2(Method::Get, &[(params::ACTION, "storage-list")]),
    },
    RouteEntry {
        kind: OperationKind::SchemaList,
        v1: v1(Method::Get, paths::SCHEMA_LIST),
        v2: v2(Method::Get, &[(params::ACTION, "schema-list")]),
    },
    RouteEntry {
        kind: OperationKind::ReadNumbers,
        v1: v1(Method::Get, paths::ALL_NUMBERS),
        v2: v2(Method::Get, &[(params::FORMAT, "number")]),
    },
    RouteEntry {
        kind: OperationKind::ReadStrings,
        v1: v1(Method::Get, paths::ALL_STRINGS),
        v2: v2(Method::Get, &[(params::FORMAT, "string")]),
    },
    RouteEntry {
        kind: OperationKind::AddNumber,
        v1: v1(Method::Post, paths::ADD_NUMBER),
        v2: v2(Method::Post, &[(params::FORMAT, "number")]),
    },
    RouteEntry {
        kind: OperationKind::AddString,
        v1: v1(Method::Post, paths::ADD_STRING),
        v2: v2(Method::Post, &[(params::FORMAT, "string")]),
    },
];

/// Table row for an operation kind.
pub fn route_entry(kind: OperationKind) -> &'static RouteEntry {
    &ROUTES[kind as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_rows_match_kinds() {
        for kind in OperationKind::ALL {
            assert_eq!(route_entry(kind).kind, kind, "row for {}", kind.name());
        }
    }

    #[test]
    fn v1_routes_have_paths_v2_routes_have_selectors() {
        for entry in ROUTES.iter() {
            assert!(entry.v1.path.starts_with('/'));
            assert!(entry.v1.selector.is_empty());
            assert!(entry.v2.path.is_empty());
            assert_eq!(entry.v2.selector.len(), 1);
            assert_eq!(entry.v1.method, entry.v2.method);
        }
    }

    #[test]
    fn writes_are_posts() {
        assert_eq!(route_entry(OperationKind::AddNumber).v1.method, Method::Post);
        assert_eq!(route_entry(OperationKind::AddString).v2.method, Method::Post);
        assert_eq!(route_entry(OperationKind::ReadNumbers).v1.method, Method::Get);
    }

    #[test]
    fn endpoint_paths() {
        assert_eq!(paths::STORAGE_LIST, "/storage/list");
        assert_eq!(paths::ALL_NUMBERS, "/timeline/all/numbers");
        assert_eq!(paths::ADD_STRING, "/timeline/add/string");
    }
}
