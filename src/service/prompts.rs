use chrono::NaiveDate;

use crate::models::plan::PlanExtraction;
use crate::service::plan_service::{EXCLUSION_WINDOWS, MAX_SUBTASK_HOURS};

pub fn intent_prompt(text: &str) -> String {
    format!(
        "{text}\n\n\
         Do not respond yet. Classify the user intention as one of 1, 2, 3. The meaning of the indices is as follows.\n\
         (1) Summarize events in the calendar.\n\
         (2) Add an event to the calendar.\n\
         (3) Plan tasks and add multiple events to the calendar.\n\
         Answer with the index only. If none applies, say nothing.\n\
         Example of (1): I want to see a list of schedule from Monday two weeks later.\n\
         Example of (2): Add a dentist appointment next Tuesday at 3 PM.\n\
         Example of (3): I need to prepare a conference talk by the end of next week, split it into 4 tasks."
    )
}

pub fn date_prompt(text: &str, today: NaiveDate) -> String {
    format!(
        "Do not respond yet. Today is {today}.\n\
         Detect any time-related phrase from the given input from the user and resolve it into a date in the format of YYYY/MM/DD and the date after that day YYYY/MM/DD+1day.\n\
         Examples include today, tomorrow, this Wednesday, next Tuesday, last Friday, 11/13, November 5th, 13th of July.\n\
         When the detected word is a day of week, make sure to include the adjective in front of it such as \"this\", \"next\", \"upcoming\", \"last\", \"past\".\n\n\
         Your output must be in JSON format. {{\"detected_phrase\": <detected phrase>, \"date\": <YYYY/MM/DD>, \"date_after_date\": <YYYY/MM/DD>}}\n\n\
         Example 1\n\
         Input: Today is 2023/1/2. ... I want to schedule a meeting at 5PM tomorrow.\n\
         Output: {{\"detected_phrase\": \"tomorrow\", \"date\": \"2023/1/3\", \"date_after_date\": \"2023/1/4\"}}\n\n\
         Example 2\n\
         Input: Today is 2023/1/2. ... What time does the class start next Friday?\n\
         Output: {{\"detected_phrase\": \"next Friday\", \"date\": \"2023/1/13\", \"date_after_date\": \"2023/1/14\"}}\n\n\
         Example 3\n\
         Input: Today is 2023/1/2. ... What is the date of this upcoming Friday?\n\
         Output: {{\"detected_phrase\": \"this upcoming Friday\", \"date\": \"2023/1/6\", \"date_after_date\": \"2023/1/7\"}}\n\n\
         Input: {text}"
    )
}

pub fn add_event_prompt(text: &str, time_zone: &str, today: NaiveDate) -> String {
    format!(
        "{text}\n\n\
         Do not respond yet. You are a sophisticated calendar management assistant, adept at organizing \
         and managing calendar schedules for both simple and complex tasks. Your role involves integrating \
         tasks into a user's calendar with precision and ensuring that all details are accurately reflected.\n\n\
         For a request like \"add meeting with Ryan Gosling tomorrow at 9 PM\", output a single JSON object \
         describing the event. Follow the format below. Only return the JSON.\n\n\
         Example\n\
         Input: \"Today is 2023/11/22. Add an event about dance in the moon light at LaLa Land with Ryan Gosling (ryangosling@example.com). \
         It will take place next Tuesday from 9 am to 5 pm LA times.\"\n\
         Output:\n\
         {{\n  \
           \"summary\": \"Dancing in the moonlight\",\n  \
           \"location\": \"LaLa Land\",\n  \
           \"description\": \"I plan to dance with Ryan Gosling in the yellow dress.\",\n  \
           \"startTime\": \"2023-11-28T09:00:00-07:00\",\n  \
           \"endTime\": \"2023-11-28T17:00:00-07:00\",\n  \
           \"timeZone\": \"America/Los_Angeles\",\n  \
           \"attendeesEmail\": [\"ryangosling@example.com\"]\n\
         }}\n\n\
         The timezone is {time_zone}\n\
         Today is {today}"
    )
}

pub fn summary_prompt(text: &str, date: NaiveDate, calendar_input: &str) -> String {
    format!(
        "You are a sophisticated calendar management assistant, adept at organizing and managing calendar \
         schedules for both simple and complex tasks.\n\
         For a given day, check the user's calendar input, which is given as a list of events, and output the agenda for the day.\n\
         Your output must be JSON in this format: {{\"date\": <YYYY/MM/DD>, \"schedule\": [{{\"summary\": <summary>, \
         \"start_time\": <HH:MM>, \"Location\": <location>, \"Participants\": [{{\"email\": <email>}}]}}]}}\n\
         Use an empty string for a missing location or missing participants.\n\n\
         Example 1\n\
         Input: The given date is 2023-11-21. Which schedule do I have on the given day?\n\
         Output: {{\"date\": \"2023/11/21\", \"schedule\": [\
         {{\"summary\": \"Check-in at Hyatt Regency Seattle\", \"start_time\": \"16:00\", \"Location\": \"Hyatt Regency, Seattle\", \
         \"Participants\": [{{\"email\": \"sheryl@zapier.com\"}}, {{\"email\": \"knoop@zapier.com\"}}]}}, \
         {{\"summary\": \"Going to Tacoma airport\", \"start_time\": \"19:00\", \"Location\": \"Seattle Tacoma International Airport\", \
         \"Participants\": \"\"}}]}}\n\n\
         Example 2\n\
         Input: The given date is 2023-11-03. Which schedule do I have on the given day?\n\
         Output: {{\"date\": \"2023/11/03\", \"schedule\": [{{\"summary\": \"Watching soccer game\", \"start_time\": \"01:00\", \
         \"Location\": \"\", \"Participants\": \"\"}}]}}\n\n\
         Calendar input: {calendar_input}\n\n\
         Input: The given date is {date}. {text}\n\n\
         Output:"
    )
}

pub fn plan_extraction_prompt(text: &str, today: NaiveDate) -> String {
    format!(
        "Do not respond yet. Today is {today}.\n\
         From the user input below, extract the task the user wants to accomplish, the time by which it must be done, \
         and the maximum number of detailed tasks the user asked for. If no number is given, use 3.\n\
         Output only JSON in this format: {{\"target_task\": <task>, \"target_time\": <deadline>, \"max_subtasks\": <number>}}\n\n\
         Example\n\
         Input: I need to select and present a paper on deep learning by next Monday. Break it into 5 steps.\n\
         Output: {{\"target_task\": \"Select and present a paper on deep learning\", \"target_time\": \"next Monday\", \"max_subtasks\": 5}}\n\n\
         Input: {text}"
    )
}

pub fn plan_decomposition_prompt(extraction: &PlanExtraction, time_zone: &str, today: NaiveDate) -> String {
    let restrictions: String = EXCLUSION_WINDOWS
        .iter()
        .enumerate()
        .map(|(i, window)| {
            format!(
                "{}. Between {:02}:00:00 and {:02}:00:00 in {time_zone} time is {} time and is excluded from schedule distribution.\n",
                i + 1,
                window.start_hour,
                window.end_hour,
                window.label
            )
        })
        .collect();

    format!(
        "###Instruction: Please assist in optimized schedule management. As a 'Schedule Management Application', \
         you suggest the tasks needed for the work the user gives, manage time effectively, and help overall productivity. \
         For the \"Target Task\" and \"Target Time\" below, create the required subtasks, distribute them appropriately \
         until the \"Target Time\", and output the distribution as a JSON array.\n\n\
         Restrictions:\n\
         {restrictions}\
         {next}. Output only JSON.\n\
         {tz_rule}. The timezone is {time_zone}.\n\
         {today_rule}. Today is {today}.\n\n\
         Considerations:\n\
         1. Consider the entire duration up to the target time and distribute tasks so they are not concentrated on specific days or times.\n\
         2. A single detailed task must take no more than {MAX_SUBTASK_HOURS} hours.\n\
         3. Produce at most {max} detailed tasks.\n\n\
         Each element must be {{\"task\": <name>, \"start\": <YYYY-MM-DDTHH:MM:SS+HH:MM>, \"end\": <YYYY-MM-DDTHH:MM:SS+HH:MM>, \"timeZone\": <IANA zone>}}.\n\n\
         Example\n\
         Today is 2023-11-21.\n\
         Target Task: I need to select and present a paper on deep learning.\n\
         Target Time: Next Monday.\n\
         Maximum number of detailed tasks: 3\n\
         Output:\n\
         [\n  \
           {{\"task\": \"Selecting a Paper\", \"start\": \"2023-11-21T09:00:00+09:00\", \"end\": \"2023-11-21T12:00:00+09:00\", \"timeZone\": \"Asia/Seoul\"}},\n  \
           {{\"task\": \"Thoroughly Reading the Paper\", \"start\": \"2023-11-22T13:00:00+09:00\", \"end\": \"2023-11-22T16:00:00+09:00\", \"timeZone\": \"Asia/Seoul\"}},\n  \
           {{\"task\": \"Creating the Presentation\", \"start\": \"2023-11-24T09:00:00+09:00\", \"end\": \"2023-11-24T12:00:00+09:00\", \"timeZone\": \"Asia/Seoul\"}}\n\
         ]\n\n\
         ###User Input:\n\
         Today is {today}.\n\
         Target Task: {task}\n\
         Target Time: {time}\n\
         Maximum number of detailed tasks: {max}",
        next = EXCLUSION_WINDOWS.len() + 1,
        tz_rule = EXCLUSION_WINDOWS.len() + 2,
        today_rule = EXCLUSION_WINDOWS.len() + 3,
        max = extraction.max_subtasks,
        task = extraction.target_task,
        time = extraction.target_time,
    )
}
