use super::forest::Forest;
use super::node::{FolderNode, TreeItem};

const YEARS: [&str; 4] = ["1st Year", "2nd Year", "3rd Year", "4th Year"];

const SUBJECTS: [&str; 8] = [
    "Programming Fundamentals",
    "Data Structures",
    "Database Systems",
    "Software Engineering",
    "Web Development",
    "Mobile Development",
    "AI & Machine Learning",
    "Computer Networks",
];

/// The forest written on first launch, or when the stored one is unreadable.
///
/// Year `n` (1-based) holds the first `n + 2` subjects; every subject holds
/// two empty folders, "Papers" and "Slides".
pub fn seed_forest() -> Forest {
    YEARS
        .iter()
        .enumerate()
        .map(|(year_index, year)| {
            let year_id = format!("year-{}", year_index + 1);
            let subjects = SUBJECTS
                .iter()
                .take(year_index + 3)
                .enumerate()
                .map(|(subject_index, subject)| {
                    let subject_id = format!("{year_id}-subject-{subject_index}");
                    TreeItem::folder(FolderNode::new(subject_id.clone(), *subject).with_children(vec![
                        TreeItem::folder(FolderNode::new(format!("{subject_id}-papers"), "Papers")),
                        TreeItem::folder(FolderNode::new(format!("{subject_id}-slides"), "Slides")),
                    ]))
                })
                .collect();
            FolderNode::new(year_id, *year).with_children(subjects)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn four_years_with_growing_subject_lists() {
        let forest = seed_forest();
        let names: Vec<&str> = forest.roots().iter().map(TreeItem::name).collect();
        assert_eq!(names, YEARS);

        let counts: Vec<usize> = forest
            .roots()
            .iter()
            .map(|year| year.as_folder().unwrap().children.len())
            .collect();
        assert_eq!(counts, vec![3, 4, 5, 6]);
    }

    #[test]
    fn every_subject_has_papers_and_slides() {
        let forest = seed_forest();
        let subject = forest.find("year-2-subject-3").unwrap();
        assert_eq!(subject.name(), "Software Engineering");
        let children: Vec<&str> = subject
            .as_folder()
            .unwrap()
            .children
            .iter()
            .map(TreeItem::name)
            .collect();
        assert_eq!(children, vec!["Papers", "Slides"]);
        assert!(forest.find("year-2-subject-3-papers").is_some());
    }

    #[test]
    fn seed_ids_are_unique() {
        let forest = seed_forest();
        let ids = forest.ids();
        let unique: HashSet<&str> = ids.iter().copied().collect();
        assert_eq!(unique.len(), ids.len());
        // 4 years + 18 subjects + 36 leaf folders
        assert_eq!(ids.len(), 4 + 18 + 36);
    }

    #[test]
    fn everything_starts_collapsed() {
        let forest = seed_forest();
        for id in forest.ids() {
            assert!(!forest.find(id).unwrap().as_folder().unwrap().is_expanded);
        }
    }
}
