mod test_offer_answer_round_trip;
