// `rowid` is SQLite's implicit row key. The table has no primary key of its own
// since tree ids are not unique.
diesel::table! {
    trees (rowid) {
        rowid -> BigInt,
        id -> Integer,
        species -> Text,
        height -> Double,
        diameter -> Double,
        health_status -> Text,
        date_planted -> Date,
        latitude -> Nullable<Double>,
        longitude -> Nullable<Double>,
        photo_path -> Nullable<Text>,
        video_path -> Nullable<Text>,
    }
}
