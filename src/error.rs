use std::convert;

use iron::{IronError, status, Response};
use itertools::Itertools;

error_chain! {
    foreign_links {
        Io(::std::io::Error);
        SerdeJson(::serde_json::Error);
        Diesel(::diesel::result::Error);
        DieselConnection(::diesel::ConnectionError);
        Utf8(::std::string::FromUtf8Error);
    }

    errors {
        // File store errors
        UploadFailed(filename: String) {
            description("An uploaded file could not be stored")
            display("Failed to save upload {}", filename)
        }
        InvalidUploadName(filename: String) {
            description("The uploaded file name has no usable file name component")
            display("Upload name {:?} is not a valid file name", filename)
        }

        // Record store errors
        RecordAppendFailed(id: i32) {
            description("The tree record could not be added to the table")
            display("Failed to add tree with ID {}", id)
        }
        RecordScanFailed {
            description("The tree table could not be read")
            display("Failed to read the tree table")
        }
        UnknownHealthStatus(value: String) {
            description("Unrecognised health status")
            display("Unknown health status {:?}", value)
        }

        // Map errors
        MarkerFailed(id: i32, reason: String) {
            description("A map marker could not be built for a tree")
            display("Marker for tree {} failed: {}", id, reason)
        }

        // Errors relating to form and url variable parsing
        InvalidField(name: String, t: String) {
            description("Wrong form field type")
            display("Field {} exists but is not {}", name, t)
        }
        NotMultipart {
            description("The request body is not multipart/form-data")
            display("Expected a multipart/form-data submission")
        }
        UnknownFormat(name: String) {
            description("The requested response format was not understood")
            display("Unrecognised format {}", name)
        }

        // Server errors
        InvalidSetting(name: String, value: String) {
            description("A setting could not be parsed")
            display("Setting {} has invalid value {:?}", name, value)
        }
        SessionStateUnavailable {
            description("The session state could not be accessed")
            display("Session state is not available")
        }
        ServerStartFailed(address: String) {
            description("The HTTP server could not be started")
            display("Failed to listen on {}", address)
        }
    }
}

impl ErrorKind {
    pub fn iron_status(&self) -> status::Status {
        match *self {
            ErrorKind::InvalidField(_, _) |
            ErrorKind::UnknownHealthStatus(_) |
            ErrorKind::InvalidUploadName(_) |
            ErrorKind::NotMultipart |
            ErrorKind::Utf8(_) => status::Status::BadRequest,
            ErrorKind::UnknownFormat(_) => status::Status::NotFound,
            _ => status::Status::InternalServerError
        }
    }
}

impl Error {
    /**
      The error and all of its causes on a single line, suitable for showing
      to the user
    */
    pub fn user_message(&self) -> String {
        self.iter().map(|e| e.to_string()).join(": ")
    }
}


impl convert::From<Error> for IronError {
    fn from(source: Error) -> IronError {
        let message = format!("{}\n", source.user_message());

        let status = source.kind().iron_status();
        IronError {
            error: Box::new(source),
            response: Response::with((status, message)),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn chained_messages_are_joined() {
        let result: Result<()> = Err(Error::from(ErrorKind::RecordScanFailed))
            .chain_err(|| ErrorKind::RecordAppendFailed(4));

        let error = result.unwrap_err();
        assert_eq!(
            error.user_message(),
            "Failed to add tree with ID 4: Failed to read the tree table"
        );
    }

    #[test]
    fn form_errors_are_bad_requests() {
        let error = Error::from(ErrorKind::InvalidField("height".into(), "a number".into()));
        assert_eq!(error.kind().iron_status(), status::Status::BadRequest);

        let error = Error::from(ErrorKind::RecordScanFailed);
        assert_eq!(error.kind().iron_status(), status::Status::InternalServerError);
    }
}
