pub mod api_client;
pub mod columns;
pub mod csv_io;
pub mod endpoints;
pub mod incentive_service;
pub mod lead_service;
pub mod leads_board;
pub mod mutation;
pub mod pager;
pub mod project_service;
pub mod report_panel;
pub mod report_service;
pub mod row_renderer;
pub mod session_service;
pub mod table_model;
