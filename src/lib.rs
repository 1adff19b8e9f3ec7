/*!
# Forum de Cancérologie: Administration

Staff dashboard for the Forum de Cancérologie participant platform, built in Rust.

## Overview

The dashboard is a thin layer in front of the forum backend REST API. It never
stores data itself: every page and every export is built from backend answers,
fetched with the bearer token of the signed-in staff member.

## Architecture

### Pages
- **Technologies**: axum, handlebars, plotters (SVG charts)
- **Key Components**:
  - Session gate - Cookie session, role check and inactivity logout
  - Dashboard home - KPI cards, activity and geographic charts
  - Participants - Date filter, counters, paginated table, consent forms
  - System users - Create, edit and delete staff accounts after confirmation
  - Activity tables - Page visits and video watches with sorting and paging
  - Profile - Current account details

### JSON proxy (`/api`)
- Forwards the caller's token to the backend
- Normalizes list answers into `{ data, pagination }`
- Maps failures to `{ "error": "..." }` with French messages

### Reports
- PDF reports with paginated tables (printpdf)
- Excel workbooks (rust_xlsxwriter)
- Consent forms, bundled into a ZIP archive when several are requested

## Modules

- **config**: Environment settings
- **backend**: HTTP client for the backend API
- **auth**: Roles, token claims, session cookies and middleware
- **models**: Backend records and their display forms
- **services**: Typed calls per backend resource
- **table**, **filters**, **stats**: Paging, sorting, date filters and counters
- **forms**: Form validation and payloads
- **charts**: SVG chart rendering
- **report**: PDF, XLSX and consent form generation
- **views**: Server-rendered pages
- **api**: JSON proxy routes
- **app**: Routing and server startup
*/

pub mod api;
pub mod app;
pub mod auth;
pub mod backend;
pub mod charts;
pub mod config;
pub mod error;
pub mod filters;
pub mod format;
pub mod forms;
pub mod models;
pub mod nav;
pub mod report;
pub mod services;
pub mod state;
pub mod stats;
pub mod table;
pub mod views;
