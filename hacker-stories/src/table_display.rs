use comfy_table::{Attribute, Cell, ContentArrangement, Table};
use crossterm::style::Stylize;

use hacker_stories::api::Story;
use hacker_stories::config::config::DisplayConfig;
use hacker_stories::data::{SortKey, SortState};

/// Column headers, with an arrow on the active sort column
fn headers(sort: &SortState, display: &DisplayConfig) -> Vec<Cell> {
    let mut columns = vec![(SortKey::Title, "Title")];
    if display.show_urls {
        columns.push((SortKey::None, "Url"));
    }
    columns.extend([
        (SortKey::Author, "Author"),
        (SortKey::Comments, "Comments"),
        (SortKey::Points, "Points"),
    ]);

    columns
        .into_iter()
        .map(|(key, name)| {
            let label = if key != SortKey::None && key == sort.sort_key {
                let arrow = if sort.is_descending() {
                    &display.icons.sort_descending
                } else {
                    &display.icons.sort_ascending
                };
                format!("{} {}", name, arrow)
            } else {
                name.to_string()
            };
            Cell::new(label).add_attribute(Attribute::Bold)
        })
        .collect()
}

pub fn build_table(stories: &[&Story], sort: &SortState, display: &DisplayConfig) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(headers(sort, display));

    for story in stories {
        let mut row = vec![story.title.clone()];
        if display.show_urls {
            row.push(story.url.clone());
        }
        row.push(story.author.clone());
        row.push(story.num_comments.to_string());
        row.push(story.points.to_string());
        table.add_row(row);
    }
    table
}

pub fn display_stories(stories: &[&Story], sort: &SortState, display: &DisplayConfig) {
    if stories.is_empty() {
        println!("{}", "No stories found.".yellow());
        return;
    }

    println!("{}", build_table(stories, sort, display));
    println!("\n{}", format!("{} stories", stories.len()).green());
}
