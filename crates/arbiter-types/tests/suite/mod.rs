mod capture;
mod supertypes;
