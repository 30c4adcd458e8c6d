//! Apple Calendar adapter: containers are calendars, items are events.

use super::AdapterError;
use super::AdapterResult;
use super::AppInfo;
use super::CreateParams;
use super::ListParams;
use super::RenderedCall;
use super::ResourceAdapter;
use super::string_prop;

const INFO: AppInfo = AppInfo {
    name: "calendar",
    display_name: "Apple Calendar",
    bundle_id: "com.apple.iCal",
};

#[derive(Default)]
pub struct CalendarAdapter;

impl ResourceAdapter for CalendarAdapter {
    fn info(&self) -> &AppInfo {
        &INFO
    }

    fn list_containers(&self) -> AdapterResult {
        Ok(RenderedCall::new("calendar.list_calendars"))
    }

    fn list(&self, params: ListParams) -> AdapterResult {
        let mut call = RenderedCall::new("calendar.list_events")
            .with_param("limit", params.limit.unwrap_or(50));
        if let Some(calendar) = params.container_id {
            call = call.with_param("calendarName", calendar);
        }
        Ok(call)
    }

    fn create(&self, params: CreateParams) -> AdapterResult {
        let title = string_prop(&params.properties, "title")
            .ok_or_else(|| {
                AdapterError::InvalidParams(
                    "calendar.create_event requires a 'title' property".to_string(),
                )
            })?;
        let start = string_prop(&params.properties, "start").ok_or_else(|| {
            AdapterError::InvalidParams(
                "calendar.create_event requires a 'start' property".to_string(),
            )
        })?;
        let end = string_prop(&params.properties, "end").ok_or_else(|| {
            AdapterError::InvalidParams(
                "calendar.create_event requires an 'end' property".to_string(),
            )
        })?;

        Ok(RenderedCall::new("calendar.create_event")
            .with_param("title", title)
            .with_param("start", start)
            .with_param("end", end)
            .with_param(
                "calendarName",
                params
                    .container_id
                    .unwrap_or_else(|| "Calendar".to_string()),
            )
            .with_param(
                "location",
                string_prop(&params.properties, "location").unwrap_or_default(),
            )
            .with_param(
                "notes",
                string_prop(&params.properties, "notes").unwrap_or_default(),
            ))
    }
}
