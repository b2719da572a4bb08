//! Fixture bases

use serde_json::{json, Value};

pub const PROJECT_TRACKER_BASE: &str = "appLmR6kJ3pb7cJtD";

/// "Design projects", the active table
pub const DESIGN_PROJECTS_TABLE: &str = "tbly388E8NA1CNhnF";
/// "Clients", linked from design projects
pub const CLIENTS_TABLE: &str = "tblyt8B45wJQIx1c3";

pub const DESIGN_PROJECTS_NAME_FIELD: &str = "fldXaTPfxIVhAUYde";
/// Link to the clients table
pub const CLIENT_FIELD: &str = "fld3DvZllJtyaNYpm";
pub const CATEGORY_FIELD: &str = "fldBBS9ICtYAuVXxj";
pub const COMPLETE_FIELD: &str = "fldT9DqpNCjoS5SkC";
pub const KICKOFF_DATE_FIELD: &str = "fldFfyeutoIiuTYaf";
pub const PROJECT_LEAD_FIELD: &str = "fld9vs0pYhAXaZgKV";

pub const CLIENTS_NAME_FIELD: &str = "fldpU8c3gHRJ6Mqsq";
/// Inverse of `CLIENT_FIELD`
pub const PROJECTS_FIELD: &str = "fld3nuJVc9ivC8IJF";

/// Active view of the design projects table
pub const ALL_PROJECTS_VIEW: &str = "viwkNnS94RQAQQTMn";
pub const BY_CATEGORY_VIEW: &str = "viwqo8mFAqy2HYSCL";
pub const KANBAN_VIEW: &str = "viw8v5XkLudbiCJfD";
pub const ALL_CLIENTS_VIEW: &str = "viwDXNvkxDkmt1FHl";

/// A two-table project tracker base
pub fn project_tracker_example() -> Value {
    json!({
        "id": PROJECT_TRACKER_BASE,
        "name": "Project tracker",
        "activeTableId": DESIGN_PROJECTS_TABLE,
        "tableOrder": [DESIGN_PROJECTS_TABLE, CLIENTS_TABLE],
        "tablesById": {
            DESIGN_PROJECTS_TABLE: {
                "id": DESIGN_PROJECTS_TABLE,
                "name": "Design projects",
                "description": null,
                "primaryFieldId": DESIGN_PROJECTS_NAME_FIELD,
                "activeViewId": ALL_PROJECTS_VIEW,
                "fieldsById": {
                    DESIGN_PROJECTS_NAME_FIELD: {
                        "id": DESIGN_PROJECTS_NAME_FIELD,
                        "name": "Name",
                        "type": "text",
                        "typeOptions": null,
                        "description": null,
                        "lock": null
                    },
                    CLIENT_FIELD: {
                        "id": CLIENT_FIELD,
                        "name": "Client",
                        "type": "foreignKey",
                        "typeOptions": {
                            "foreignTableId": CLIENTS_TABLE,
                            "relationship": "many",
                            "symmetricColumnId": PROJECTS_FIELD
                        },
                        "description": "the project client",
                        "lock": null
                    },
                    CATEGORY_FIELD: {
                        "id": CATEGORY_FIELD,
                        "name": "Category",
                        "type": "select",
                        "typeOptions": {
                            "choices": [
                                {"id": "selEhtOfm4IMoBfXx", "name": "Brand identity", "color": "blue"},
                                {"id": "selVBnIv2ywzkrDFi", "name": "Technology design", "color": "cyan"}
                            ]
                        },
                        "description": null,
                        "lock": null
                    },
                    COMPLETE_FIELD: {
                        "id": COMPLETE_FIELD,
                        "name": "Complete",
                        "type": "checkbox",
                        "typeOptions": {"color": "green", "icon": "check"},
                        "description": null,
                        "lock": null
                    },
                    KICKOFF_DATE_FIELD: {
                        "id": KICKOFF_DATE_FIELD,
                        "name": "Kickoff date",
                        "type": "date",
                        "typeOptions": {"isDateTime": false, "dateFormat": "Local"},
                        "description": null,
                        "lock": null
                    },
                    PROJECT_LEAD_FIELD: {
                        "id": PROJECT_LEAD_FIELD,
                        "name": "Project lead",
                        "type": "collaborator",
                        "typeOptions": {"shouldNotify": false},
                        "description": null,
                        "lock": null
                    }
                },
                "viewOrder": [ALL_PROJECTS_VIEW, BY_CATEGORY_VIEW, KANBAN_VIEW],
                "viewsById": {
                    ALL_PROJECTS_VIEW: {"id": ALL_PROJECTS_VIEW, "name": "All projects", "type": "grid"},
                    BY_CATEGORY_VIEW: {"id": BY_CATEGORY_VIEW, "name": "By category", "type": "grid"},
                    KANBAN_VIEW: {"id": KANBAN_VIEW, "name": "Project pipeline", "type": "kanban"}
                }
            },
            CLIENTS_TABLE: {
                "id": CLIENTS_TABLE,
                "name": "Clients",
                "description": "Companies we work with",
                "primaryFieldId": CLIENTS_NAME_FIELD,
                "activeViewId": ALL_CLIENTS_VIEW,
                "fieldsById": {
                    CLIENTS_NAME_FIELD: {
                        "id": CLIENTS_NAME_FIELD,
                        "name": "Name",
                        "type": "text",
                        "typeOptions": null,
                        "description": null,
                        "lock": null
                    },
                    PROJECTS_FIELD: {
                        "id": PROJECTS_FIELD,
                        "name": "Projects",
                        "type": "foreignKey",
                        "typeOptions": {
                            "foreignTableId": DESIGN_PROJECTS_TABLE,
                            "relationship": "many",
                            "symmetricColumnId": CLIENT_FIELD
                        },
                        "description": null,
                        "lock": null
                    }
                },
                "viewOrder": [ALL_CLIENTS_VIEW],
                "viewsById": {
                    ALL_CLIENTS_VIEW: {"id": ALL_CLIENTS_VIEW, "name": "All clients", "type": "grid"}
                }
            }
        }
    })
}

/// Record data for the design projects table, as returned by a table
/// fetch-and-subscribe
pub fn design_projects_records() -> Value {
    json!({
        "recordsById": {
            "recA": {
                "id": "recA",
                "cellValuesByFieldId": {
                    DESIGN_PROJECTS_NAME_FIELD: "Coffee packaging",
                    COMPLETE_FIELD: true
                },
                "commentCount": 2,
                "createdTime": "2024-01-15T10:00:00.000Z"
            },
            "recB": {
                "id": "recB",
                "cellValuesByFieldId": {
                    DESIGN_PROJECTS_NAME_FIELD: "Bike share app",
                    CLIENT_FIELD: [{"id": "recClient1", "name": "Pedal Co"}]
                },
                "commentCount": 0,
                "createdTime": "2024-02-03T09:30:00.000Z"
            }
        }
    })
}

/// Empty selection, as returned by a cursor fetch-and-subscribe
pub fn empty_cursor_data() -> Value {
    json!({
        "selectedRecordIdSet": {},
        "selectedFieldIdSet": {}
    })
}
