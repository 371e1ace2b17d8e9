// Classic Minesweeper
// Board engine, game session, player preferences and the terminal front end

pub mod msw_board;   // Mine placement, adjacency and flood-fill reveal
pub mod msw_color;   // Number colours per terminal capability
pub mod msw_config;  // Difficulty presets and preferences file
pub mod msw_log;     // File-backed tracing setup
pub mod msw_session; // One game in progress with its clock
pub mod msw_ui;      // Terminal rendering and input handling
