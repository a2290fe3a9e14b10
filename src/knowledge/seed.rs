//! Built-in school knowledge base

use super::store::FactStore;
use crate::error::Result;

/// Facts the assistant answers from
pub const SCHOOL_FACTS: [&str; 10] = [
    "The school library is open from 8 AM to 4 PM on weekdays. Students can borrow up to 3 books at a time.",
    "The principal of the school is Dr. Sarah Smith. Dr. Smith has been the principal for 5 years and holds a PhD in Education.",
    "The school canteen serves pizza every Friday. The menu also includes sandwiches, salads, and drinks.",
    "The computer science lab has 30 computers running the latest software. The lab is available for students during lunch breaks and after school.",
    "All students must wear their ID cards at all times within the school premises. Lost ID cards can be replaced at the administration office for a small fee.",
    "School assembly is held every Monday at 8:30 AM in the main auditorium. Attendance is mandatory for all students.",
    "The basketball team practice is from 3 PM to 5 PM on Tuesdays and Thursdays. Coach Johnson supervises the practice sessions. Students need to try out for the team in the first week of semester.",
    "Basketball is available to all students who make the team through tryouts. Tryouts are held in the first week of each semester.",
    "The school gym is open for general use from 4 PM to 6 PM on weekdays for students who want to practice sports.",
    "To join any school sports team, students must maintain a minimum GPA of 2.5 and have parental permission.",
];

/// Build the fact store for the school knowledge base
pub fn school_knowledge_base() -> Result<FactStore> {
    FactStore::from_texts(SCHOOL_FACTS)
}
